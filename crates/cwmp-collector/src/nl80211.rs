//! Wireless station enumeration over generic netlink (nl80211).
//!
//! Speaks the genetlink wire protocol directly over an `AF_NETLINK` socket:
//! resolve the `nl80211` family id, then issue a `GET_STATION` dump for the
//! interface and collect MAC, signal and inactivity per station. Any
//! failure — no netlink, no such family, no such interface — degrades to an
//! empty station list; wireless absence must never fail a session.
//!
//! Blocking; call from `spawn_blocking` on the async side.

use std::ffi::CString;
use std::io;
use std::os::fd::RawFd;

use tracing::debug;

const NETLINK_GENERIC: i32 = 16;

const NLMSG_ERROR: u16 = 2;
const NLMSG_DONE: u16 = 3;

const NLM_F_REQUEST: u16 = 0x01;
const NLM_F_DUMP: u16 = 0x300;

const GENL_ID_CTRL: u16 = 0x10;
const CTRL_CMD_GETFAMILY: u8 = 3;
const CTRL_ATTR_FAMILY_ID: u16 = 1;
const CTRL_ATTR_FAMILY_NAME: u16 = 2;

const NL80211_CMD_GET_STATION: u8 = 17;
const NL80211_ATTR_IFINDEX: u16 = 3;
const NL80211_ATTR_MAC: u16 = 6;
const NL80211_ATTR_STA_INFO: u16 = 21;
const NL80211_STA_INFO_INACTIVE_TIME: u16 = 1;
const NL80211_STA_INFO_SIGNAL: u16 = 7;

const NLA_TYPE_MASK: u16 = 0x3fff;
const NLMSG_HDRLEN: usize = 16;
const GENL_HDRLEN: usize = 4;
const NLA_HDRLEN: usize = 4;

/// One associated wireless station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Station {
    pub mac: String,
    /// Last measured signal strength in dBm.
    pub signal_dbm: i32,
    /// Time since the station was last active, in milliseconds.
    pub inactive_ms: u32,
}

/// Enumerates stations associated to `ifname`. Empty on any failure.
pub fn station_dump(ifname: &str) -> Vec<Station> {
    match try_station_dump(ifname) {
        Ok(stations) => stations,
        Err(error) => {
            debug!(ifname, %error, "nl80211 station dump unavailable");
            Vec::new()
        }
    }
}

fn try_station_dump(ifname: &str) -> io::Result<Vec<Station>> {
    let ifindex = interface_index(ifname)?;
    let socket = NetlinkSocket::open()?;
    let family_id = socket.resolve_family("nl80211")?;

    let mut payload = Vec::with_capacity(GENL_HDRLEN + 8);
    payload.extend_from_slice(&[NL80211_CMD_GET_STATION, 0, 0, 0]);
    push_attr(&mut payload, NL80211_ATTR_IFINDEX, &ifindex.to_ne_bytes());
    socket.send(family_id, NLM_F_REQUEST | NLM_F_DUMP, &payload)?;

    let mut stations = Vec::new();
    socket.for_each_message(|message| {
        if let Some(station) = parse_station(message) {
            stations.push(station);
        }
    })?;
    Ok(stations)
}

fn interface_index(ifname: &str) -> io::Result<u32> {
    let name = CString::new(ifname)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "NUL in interface name"))?;
    // SAFETY: `name` is a valid NUL-terminated C string.
    let index = unsafe { libc::if_nametoindex(name.as_ptr()) };
    if index == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(index)
}

struct NetlinkSocket {
    fd: RawFd,
}

impl NetlinkSocket {
    fn open() -> io::Result<Self> {
        // SAFETY: plain socket(2) call, result checked below.
        let fd = unsafe {
            libc::socket(
                libc::AF_NETLINK,
                libc::SOCK_RAW | libc::SOCK_CLOEXEC,
                NETLINK_GENERIC,
            )
        };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        let socket = Self { fd };

        // Bound receives: a stuck kernel reply must not hang the refresh job.
        let timeout = libc::timeval {
            tv_sec: 5,
            tv_usec: 0,
        };
        // SAFETY: fd is a valid socket, timeval outlives the call.
        unsafe {
            libc::setsockopt(
                socket.fd,
                libc::SOL_SOCKET,
                libc::SO_RCVTIMEO,
                std::ptr::addr_of!(timeout).cast(),
                std::mem::size_of::<libc::timeval>() as libc::socklen_t,
            );
        }

        // SAFETY: sockaddr_nl is plain-old-data; zeroed is its wildcard bind.
        let mut addr: libc::sockaddr_nl = unsafe { std::mem::zeroed() };
        addr.nl_family = libc::AF_NETLINK as libc::sa_family_t;
        // SAFETY: addr is a valid sockaddr_nl for this socket family.
        let rc = unsafe {
            libc::bind(
                socket.fd,
                std::ptr::addr_of!(addr).cast(),
                std::mem::size_of::<libc::sockaddr_nl>() as libc::socklen_t,
            )
        };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(socket)
    }

    fn send(&self, message_type: u16, flags: u16, payload: &[u8]) -> io::Result<()> {
        let total = NLMSG_HDRLEN + payload.len();
        let mut buffer = Vec::with_capacity(total);
        buffer.extend_from_slice(&(total as u32).to_ne_bytes());
        buffer.extend_from_slice(&message_type.to_ne_bytes());
        buffer.extend_from_slice(&flags.to_ne_bytes());
        buffer.extend_from_slice(&1u32.to_ne_bytes()); // seq
        buffer.extend_from_slice(&0u32.to_ne_bytes()); // pid: kernel assigns
        buffer.extend_from_slice(payload);

        // SAFETY: buffer is valid for buffer.len() bytes.
        let sent = unsafe { libc::send(self.fd, buffer.as_ptr().cast(), buffer.len(), 0) };
        if sent < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn recv(&self, buffer: &mut [u8]) -> io::Result<usize> {
        // SAFETY: buffer is valid for buffer.len() writable bytes.
        let received = unsafe { libc::recv(self.fd, buffer.as_mut_ptr().cast(), buffer.len(), 0) };
        if received < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(received as usize)
    }

    /// Reads datagrams and hands every genetlink payload to `handle` until
    /// the dump is done (or a non-multipart reply is consumed).
    fn for_each_message(&self, mut handle: impl FnMut(&[u8])) -> io::Result<()> {
        let mut buffer = vec![0u8; 8192];
        loop {
            let received = self.recv(&mut buffer)?;
            let mut offset = 0;
            while offset + NLMSG_HDRLEN <= received {
                let length = u32::from_ne_bytes(read4(&buffer, offset)) as usize;
                if length < NLMSG_HDRLEN || offset + length > received {
                    return Ok(());
                }
                let message_type =
                    u16::from_ne_bytes([buffer[offset + 4], buffer[offset + 5]]);
                let flags = u16::from_ne_bytes([buffer[offset + 6], buffer[offset + 7]]);
                match message_type {
                    NLMSG_DONE => return Ok(()),
                    NLMSG_ERROR => {
                        let code =
                            i32::from_ne_bytes(read4(&buffer, offset + NLMSG_HDRLEN));
                        if code == 0 {
                            return Ok(()); // ack
                        }
                        return Err(io::Error::from_raw_os_error(-code));
                    }
                    _ => handle(&buffer[offset + NLMSG_HDRLEN..offset + length]),
                }
                let multipart = flags & 0x02 != 0; // NLM_F_MULTI
                if !multipart {
                    return Ok(());
                }
                offset += align4(length);
            }
        }
    }

    fn resolve_family(&self, name: &str) -> io::Result<u16> {
        let mut payload = Vec::with_capacity(GENL_HDRLEN + 16);
        payload.extend_from_slice(&[CTRL_CMD_GETFAMILY, 1, 0, 0]);
        let mut family = name.as_bytes().to_vec();
        family.push(0);
        push_attr(&mut payload, CTRL_ATTR_FAMILY_NAME, &family);
        self.send(GENL_ID_CTRL, NLM_F_REQUEST, &payload)?;

        let mut family_id = None;
        self.for_each_message(|message| {
            for (attr_type, value) in attributes(&message[GENL_HDRLEN..]) {
                if attr_type == CTRL_ATTR_FAMILY_ID && value.len() >= 2 {
                    family_id = Some(u16::from_ne_bytes([value[0], value[1]]));
                }
            }
        })?;
        family_id.ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no {name} family"))
        })
    }
}

impl Drop for NetlinkSocket {
    fn drop(&mut self) {
        // SAFETY: fd was opened by this struct and is closed exactly once.
        unsafe {
            libc::close(self.fd);
        }
    }
}

fn align4(value: usize) -> usize {
    (value + 3) & !3
}

fn read4(buffer: &[u8], offset: usize) -> [u8; 4] {
    [
        buffer[offset],
        buffer[offset + 1],
        buffer[offset + 2],
        buffer[offset + 3],
    ]
}

fn push_attr(buffer: &mut Vec<u8>, attr_type: u16, value: &[u8]) {
    let length = (NLA_HDRLEN + value.len()) as u16;
    buffer.extend_from_slice(&length.to_ne_bytes());
    buffer.extend_from_slice(&attr_type.to_ne_bytes());
    buffer.extend_from_slice(value);
    buffer.resize(align4(buffer.len()), 0);
}

/// Iterates `(type, payload)` pairs of a netlink attribute block.
fn attributes<'a>(mut block: &'a [u8]) -> impl Iterator<Item = (u16, &'a [u8])> + 'a {
    std::iter::from_fn(move || {
        if block.len() < NLA_HDRLEN {
            return None;
        }
        let length = u16::from_ne_bytes([block[0], block[1]]) as usize;
        let attr_type = u16::from_ne_bytes([block[2], block[3]]) & NLA_TYPE_MASK;
        if length < NLA_HDRLEN || length > block.len() {
            return None;
        }
        let value = &block[NLA_HDRLEN..length];
        block = &block[align4(length).min(block.len())..];
        Some((attr_type, value))
    })
}

fn parse_station(message: &[u8]) -> Option<Station> {
    if message.len() < GENL_HDRLEN {
        return None;
    }
    let mut mac = None;
    let mut signal = 0i32;
    let mut inactive = 0u32;

    for (attr_type, value) in attributes(&message[GENL_HDRLEN..]) {
        match attr_type {
            NL80211_ATTR_MAC if value.len() >= 6 => {
                mac = Some(format!(
                    "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
                    value[0], value[1], value[2], value[3], value[4], value[5]
                ));
            }
            NL80211_ATTR_STA_INFO => {
                for (info_type, info) in attributes(value) {
                    match info_type {
                        NL80211_STA_INFO_SIGNAL if !info.is_empty() => {
                            signal = i32::from(info[0] as i8);
                        }
                        NL80211_STA_INFO_INACTIVE_TIME if info.len() >= 4 => {
                            inactive = u32::from_ne_bytes([info[0], info[1], info[2], info[3]]);
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    mac.map(|mac| Station {
        mac,
        signal_dbm: signal,
        inactive_ms: inactive,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(attr_type: u16, value: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        push_attr(&mut out, attr_type, value);
        out
    }

    #[test]
    fn attribute_iteration_handles_padding() {
        let mut block = attr(CTRL_ATTR_FAMILY_ID, &[0x1c, 0x00]);
        block.extend(attr(CTRL_ATTR_FAMILY_NAME, b"nl80211\0"));
        let parsed: Vec<(u16, Vec<u8>)> = attributes(&block)
            .map(|(t, v)| (t, v.to_vec()))
            .collect();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0], (CTRL_ATTR_FAMILY_ID, vec![0x1c, 0x00]));
        assert_eq!(parsed[1].1, b"nl80211\0".to_vec());
    }

    #[test]
    fn parses_a_station_message() {
        let mut sta_info = attr(NL80211_STA_INFO_SIGNAL, &[(-62i8) as u8]);
        sta_info.extend(attr(NL80211_STA_INFO_INACTIVE_TIME, &1500u32.to_ne_bytes()));

        let mut message = vec![NL80211_CMD_GET_STATION, 0, 0, 0];
        message.extend(attr(
            NL80211_ATTR_MAC,
            &[0xb8, 0x27, 0xeb, 0x89, 0xcc, 0x2d],
        ));
        message.extend(attr(NL80211_ATTR_STA_INFO, &sta_info));

        let station = parse_station(&message).unwrap();
        assert_eq!(station.mac, "b8:27:eb:89:cc:2d");
        assert_eq!(station.signal_dbm, -62);
        assert_eq!(station.inactive_ms, 1500);
    }

    #[test]
    fn truncated_or_foreign_messages_yield_nothing() {
        assert_eq!(parse_station(&[]), None);
        let message = vec![NL80211_CMD_GET_STATION, 0, 0, 0];
        assert_eq!(parse_station(&message), None);
    }

    #[test]
    fn missing_interface_degrades_to_empty() {
        assert!(station_dump("definitely-not-a-wifi-if").is_empty());
    }
}
