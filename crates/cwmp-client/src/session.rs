//! The CWMP session engine.
//!
//! One long-lived task owns the mirror and drives sessions: periodic
//! informs, boot/bootstrap announcements, connection requests and CLI
//! one-shots. Within a session request/response pairs are strictly ordered
//! and a new trigger cannot open a parallel session — the engine simply is
//! not listening while one runs.

use std::path::PathBuf;
use std::time::Duration;

use cwmp_collector::registry::InformSettings;
use cwmp_collector::{CollectorRegistry, ExecConfig, Executor};
use cwmp_datamodel::Device;
use cwmp_soap::request::{DeviceId, EventStruct, Inform, RequestBody, RequestEnvelope};
use cwmp_soap::response::ResponseBody;
use cwmp_soap::value::{ParameterValue, TypedValue};
use cwmp_soap::CwmpTime;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use crate::config::AgentConfig;
use crate::dispatch::{Dispatcher, ExecExtension, ExtensionHandler, SideEffect};
use crate::scheduler::{Backoff, Event};
use crate::transport::{AcsClient, AcsReply, SessionError};

/// Upper bound for one full inform/dispatch chain.
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Informing,
    Dispatching,
    Closing,
    Backoff,
}

impl SessionState {
    fn state_name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Connecting => "Connecting",
            Self::Informing => "Informing",
            Self::Dispatching => "Dispatching",
            Self::Closing => "Closing",
            Self::Backoff => "Backoff",
        }
    }
}

pub struct SessionEngine {
    config: AgentConfig,
    device: Device,
    registry: CollectorRegistry,
    executor: Executor,
    extension: Box<dyn ExtensionHandler>,
    state: SessionState,
    backoff: Backoff,
    retry_count: u32,
    /// Where the bootstrap marker lives; first contact ever adds
    /// `"0 BOOTSTRAP"` to the boot inform.
    bootstrap_marker: PathBuf,
    /// Queue of request bodies owed to the ACS at the start of the next
    /// session (TransferComplete reports).
    outbox: Vec<RequestBody>,
    events_tx: mpsc::Sender<Event>,
}

impl SessionEngine {
    pub fn new(
        config: AgentConfig,
        bootstrap_marker: PathBuf,
        events_tx: mpsc::Sender<Event>,
    ) -> anyhow::Result<Self> {
        let ssh = config
            .ssh
            .as_ref()
            .map(crate::config::SshSettings::to_ssh_config)
            .transpose()?;
        let executor = Executor::new(ExecConfig { timeout: None, ssh });
        let registry = cwmp_collector::registry::inform_registry(&InformSettings {
            acs_url: config.acs_url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            serial_number: config.serial_number.clone(),
            periodic_interval_secs: config.periodic_interval,
            provisioning_code: config.provisioning_code.clone(),
        });
        Ok(Self {
            config,
            device: Device::default(),
            registry,
            executor,
            extension: Box::new(ExecExtension),
            state: SessionState::Idle,
            backoff: Backoff::default(),
            retry_count: 0,
            bootstrap_marker,
            outbox: Vec::new(),
            events_tx,
        })
    }

    fn set_state(&mut self, state: SessionState) {
        info!(state = state.state_name(), "session state");
        self.state = state;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The long-running loop: periodic ticks plus queued events. Session
    /// timeouts grow the interval (capped); a successful session resets it.
    pub async fn run(&mut self, mut events: mpsc::Receiver<Event>) {
        let base_interval = self.config.periodic_interval();
        let max_interval = self.config.periodic_interval_max();
        let mut interval = base_interval;

        loop {
            tokio::select! {
                () = tokio::time::sleep(interval) => {
                    match self.session_with_timeout(vec![EventStruct::new("2 PERIODIC")]).await {
                        SessionVerdict::Ok => {
                            interval = base_interval;
                        }
                        SessionVerdict::TimedOut => {
                            interval = (interval * 2).min(max_interval);
                            warn!(
                                next_interval_secs = interval.as_secs(),
                                "session timed out, stretching periodic interval"
                            );
                        }
                        SessionVerdict::Failed => {}
                    }
                }
                event = events.recv() => {
                    let Some(event) = event else { break };
                    let _ = self.handle_event(event).await;
                }
            }
        }
    }

    async fn handle_event(&mut self, event: Event) -> SessionVerdict {
        let events = match event {
            Event::Boot => return self.boot().await,
            Event::ValueChange => vec![EventStruct::new("4 VALUE CHANGE")],
            Event::ConnectionRequest => vec![EventStruct::new("6 CONNECTION REQUEST")],
            Event::CliInform(code) => vec![EventStruct::new(code)],
            Event::TransferComplete(report) => {
                self.outbox.push(RequestBody::TransferComplete(report));
                vec![EventStruct::new("7 TRANSFER COMPLETE")]
            }
        };
        self.session_with_timeout(events).await
    }

    /// Boot announcement; first contact ever also carries `"0 BOOTSTRAP"`.
    async fn boot(&mut self) -> SessionVerdict {
        let mut events = Vec::new();
        if !self.bootstrap_marker.exists() {
            events.push(EventStruct::new("0 BOOTSTRAP"));
        }
        events.push(EventStruct::new("1 BOOT"));
        let verdict = self.session_with_timeout(events).await;
        if matches!(verdict, SessionVerdict::Ok) && !self.bootstrap_marker.exists() {
            if let Err(error) = std::fs::write(&self.bootstrap_marker, b"") {
                warn!(%error, "failed to persist bootstrap marker");
            }
        }
        verdict
    }

    /// One-shot session for the `inform <event>` CLI verb.
    pub async fn inform_once(&mut self, event_code: &str) -> Result<(), SessionError> {
        match self
            .handle_event(Event::CliInform(event_code.to_owned()))
            .await
        {
            SessionVerdict::Ok => Ok(()),
            SessionVerdict::TimedOut => Err(SessionError::Timeout),
            SessionVerdict::Failed => {
                Err(SessionError::Transport("session did not complete".to_owned()))
            }
        }
    }

    async fn session_with_timeout(&mut self, events: Vec<EventStruct>) -> SessionVerdict {
        match tokio::time::timeout(SESSION_TIMEOUT, self.run_session(events)).await {
            Ok(Ok(())) => {
                self.backoff.reset();
                self.retry_count = 0;
                SessionVerdict::Ok
            }
            Ok(Err(error)) => {
                error!(%error, "session failed");
                self.retry_count = self.retry_count.saturating_add(1);
                self.set_state(SessionState::Backoff);
                let delay = self.backoff.next_delay();
                info!(delay_secs = delay.as_secs(), "backing off before reconnect");
                tokio::time::sleep(delay).await;
                self.set_state(SessionState::Idle);
                SessionVerdict::Failed
            }
            Err(_elapsed) => {
                error!(timeout = ?SESSION_TIMEOUT, "session deadline expired");
                self.retry_count = self.retry_count.saturating_add(1);
                self.set_state(SessionState::Idle);
                SessionVerdict::TimedOut
            }
        }
    }

    /// One full session: inform, then answer ACS requests in order until it
    /// has nothing further.
    #[instrument(level = "info", skip_all)]
    async fn run_session(&mut self, events: Vec<EventStruct>) -> Result<(), SessionError> {
        if let Some(event) = events.first() {
            info!(event = %event.event_code, "opening session");
        }
        self.set_state(SessionState::Connecting);
        let client = AcsClient::new(
            self.config.acs_url.clone(),
            Some(self.config.username.clone()),
            Some(self.config.password.clone()),
        )?;

        self.set_state(SessionState::Informing);
        let inform = self.build_inform(events).await;
        let serial = inform.device_id.serial_number.clone();
        let envelope = RequestEnvelope::builder()
            .id(serial.clone())
            .body(RequestBody::Inform(inform))
            .build();

        let reply = client.post(Some(envelope.to_xml())).await?;
        let mut session_id = serial.clone();
        match reply {
            AcsReply::Envelope(response) => {
                if let Some(id) = &response.id {
                    if !id.is_empty() {
                        session_id = id.clone();
                    }
                }
                let ResponseBody::InformResponse(inform_response) = &response.body else {
                    return Err(SessionError::Transport(format!(
                        "expected InformResponse, got {}",
                        response.body.method_name()
                    )));
                };
                debug!(max_envelopes = inform_response.max_envelopes, "inform accepted");
            }
            AcsReply::End => {
                // An ACS that drops the session after the inform is done
                // with us; not an error.
                self.set_state(SessionState::Closing);
                self.set_state(SessionState::Idle);
                return Ok(());
            }
        }

        self.set_state(SessionState::Dispatching);
        let mut effects: Vec<SideEffect> = Vec::new();
        let mut outbox: Vec<RequestBody> = std::mem::take(&mut self.outbox);
        outbox.reverse(); // treat as a queue, pop from the back
        let mut next_body = outbox.pop();

        loop {
            let payload = next_body.take().map(|body| {
                RequestEnvelope::builder()
                    .id(session_id.clone())
                    .body(body)
                    .build()
                    .to_xml()
            });
            match client.post(payload).await? {
                AcsReply::End => break,
                AcsReply::Envelope(response) => {
                    if let Some(id) = &response.id {
                        if !id.is_empty() {
                            session_id = id.clone();
                        }
                    }
                    let mut dispatcher = Dispatcher {
                        device: &mut self.device,
                        registry: &self.registry,
                        executor: &self.executor,
                        ssh_host: self.config.ssh.as_ref().map(|s| s.host.as_str()),
                        extension: self.extension.as_ref(),
                        effects: &mut effects,
                    };
                    next_body = match dispatcher.dispatch(&response.body).await {
                        Some(body) => Some(body),
                        None => outbox.pop(),
                    };
                }
            }
        }

        self.set_state(SessionState::Closing);
        self.set_state(SessionState::Idle);
        self.execute_effects(effects);
        Ok(())
    }

    /// Builds the Inform body: collector batch first, then the envelope.
    /// Collector outputs also refresh the mirror's identity leaves.
    async fn build_inform(&mut self, events: Vec<EventStruct>) -> Inform {
        let ssh_host = self.config.ssh.as_ref().map(|s| s.host.clone());
        let ssh_host = ssh_host.as_deref();

        let paths = self.registry.paths();
        let collected = futures::future::join_all(paths.iter().map(|path| {
            let registry = &self.registry;
            let executor = &self.executor;
            async move {
                registry
                    .collect(path, executor, ssh_host)
                    .await
                    .map(|result| ((*path).to_owned(), result.text))
            }
        }))
        .await;

        let mut parameter_list = Vec::new();
        let mut device_id = DeviceId::default();
        for (path, value) in collected.into_iter().flatten() {
            match path.as_str() {
                "Device.DeviceInfo.Manufacturer" => {
                    device_id.manufacturer = value.clone();
                    self.device.device_info.manufacturer = value.clone();
                }
                "Device.DeviceInfo.ManufacturerOUI" => {
                    device_id.oui = value.clone();
                    self.device.device_info.manufacturer_oui = value.clone();
                }
                "Device.DeviceInfo.ProductClass" => {
                    device_id.product_class = value.clone();
                    self.device.device_info.product_class = value.clone();
                }
                "Device.DeviceInfo.SerialNumber" => {
                    device_id.serial_number = value.clone();
                    self.device.device_info.serial_number = value.clone();
                }
                "Device.DeviceInfo.ModelName" => {
                    self.device.device_info.model_name = value.clone();
                }
                "Device.DeviceInfo.SoftwareVersion" => {
                    self.device.device_info.software_version = value.clone();
                }
                "Device.DeviceInfo.HardwareVersion" => {
                    self.device.device_info.hardware_version = value.clone();
                }
                "Device.DeviceInfo.UpTime" => {
                    self.device.device_info.up_time = value.parse().unwrap_or(0);
                }
                "Device.DeviceInfo.ProvisioningCode" => {
                    self.device.device_info.provisioning_code = value.clone();
                }
                "Device.ManagementServer.Username" => {
                    self.device.management_server.username = value.clone();
                }
                "Device.ManagementServer.Password" => {
                    self.device.management_server.password = value.clone();
                }
                _ => {}
            }
            parameter_list.push(ParameterValue::new(
                path.clone(),
                TypedValue::typed(cwmp_datamodel::xsd_type_for(&path), value),
            ));
        }

        for field in [
            &mut device_id.manufacturer,
            &mut device_id.oui,
            &mut device_id.product_class,
            &mut device_id.serial_number,
        ] {
            if field.is_empty() {
                *field = "Unknown".to_owned();
            }
        }

        self.device.management_server.url = self.config.acs_url.clone();
        self.device.management_server.periodic_inform_enable = true;
        self.device.management_server.periodic_inform_interval =
            self.config.periodic_interval as u32;

        Inform::builder()
            .device_id(device_id)
            .events(events)
            .current_time(CwmpTime::now())
            .retry_count(self.retry_count)
            .parameter_list(parameter_list)
            .build()
    }

    /// Executes the side effects a closed session scheduled.
    fn execute_effects(&mut self, effects: Vec<SideEffect>) {
        for effect in effects {
            match effect {
                SideEffect::Download {
                    command_key,
                    url,
                    username,
                    password,
                    target_file_name,
                } => {
                    let events = self.events_tx.clone();
                    tokio::spawn(async move {
                        let report =
                            download(&url, username, password, &target_file_name, command_key)
                                .await;
                        let _ = events.send(Event::TransferComplete(report)).await;
                    });
                }
                SideEffect::Reboot { command_key } => {
                    info!(%command_key, "reboot scheduled");
                    let executor = self.executor.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(Duration::from_secs(2)).await;
                        let _ = executor.shell("reboot").await;
                    });
                }
                SideEffect::FactoryReset { command_key } => {
                    info!(%command_key, "factory reset scheduled");
                    let executor = self.executor.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(Duration::from_secs(2)).await;
                        let _ = executor
                            .shell("firstboot -y >/dev/null 2>&1; reboot")
                            .await;
                    });
                }
            }
        }
    }
}

enum SessionVerdict {
    Ok,
    Failed,
    TimedOut,
}

/// Retrieves a scheduled download and builds the TransferComplete report.
async fn download(
    url: &str,
    username: Option<String>,
    password: Option<String>,
    target_file_name: &str,
    command_key: String,
) -> cwmp_soap::request::TransferComplete {
    let start_time = CwmpTime::now();
    let outcome = fetch_to_file(url, username, password, target_file_name).await;
    let (fault_code, fault_string) = match outcome {
        Ok(bytes) => {
            info!(url, bytes, target_file_name, "download complete");
            (0, String::new())
        }
        Err(error) => {
            warn!(url, %error, "download failed");
            (9010, error)
        }
    };
    cwmp_soap::request::TransferComplete {
        command_key,
        fault_code,
        fault_string,
        start_time,
        complete_time: CwmpTime::now(),
    }
}

async fn fetch_to_file(
    url: &str,
    username: Option<String>,
    password: Option<String>,
    target_file_name: &str,
) -> Result<u64, String> {
    let client = reqwest::Client::builder()
        .use_native_tls()
        .timeout(Duration::from_secs(300))
        .build()
        .map_err(|e| e.to_string())?;
    let mut request = client.get(url);
    if let Some(username) = username {
        request = request.basic_auth(username, password);
    }
    let response = request.send().await.map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("download status {}", response.status()));
    }
    let bytes = response.bytes().await.map_err(|e| e.to_string())?;
    let target = std::path::Path::new("/tmp").join(
        std::path::Path::new(target_file_name)
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("download.bin")),
    );
    tokio::fs::write(&target, &bytes)
        .await
        .map_err(|e| e.to_string())?;
    Ok(bytes.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler;

    fn engine() -> SessionEngine {
        let (tx, _rx) = scheduler::event_queue();
        let config = AgentConfig {
            serial_number: "SN1".to_owned(),
            username: "cpe-1".to_owned(),
            password: "hunter2".to_owned(),
            ..AgentConfig::default()
        };
        SessionEngine::new(config, std::env::temp_dir().join("cwmp-test-bootstrap"), tx).unwrap()
    }

    #[tokio::test]
    async fn inform_carries_device_identity_and_event() {
        let mut engine = engine();
        let inform = engine
            .build_inform(vec![EventStruct::new("2 PERIODIC")])
            .await;

        assert_eq!(inform.device_id.serial_number, "SN1");
        assert_eq!(inform.events[0].event_code, "2 PERIODIC");
        assert_eq!(inform.max_envelopes, 1);

        let url = inform
            .parameter_list
            .iter()
            .find(|p| p.name == "Device.ManagementServer.URL")
            .unwrap();
        assert_eq!(url.value.text, AgentConfig::default().acs_url);

        let interval = inform
            .parameter_list
            .iter()
            .find(|p| p.name == "Device.ManagementServer.PeriodicInformInterval")
            .unwrap();
        assert_eq!(interval.value.xsd, cwmp_soap::XsdType::UnsignedInt);

        // everything reported must exist in the mirror's parameter space
        for parameter in &inform.parameter_list {
            assert!(
                parameter.name.starts_with("Device.DeviceInfo.")
                    || parameter.name.starts_with("Device.ManagementServer.")
                    || parameter.name == "Device.OutsideIPAddress",
                "unexpected parameter name {}",
                parameter.name
            );
        }
    }

    #[tokio::test]
    async fn collected_credentials_land_in_the_mirror() {
        let mut engine = engine();
        let _ = engine
            .build_inform(vec![EventStruct::new("2 PERIODIC")])
            .await;
        assert_eq!(engine.device.management_server.username, "cpe-1");
        assert_eq!(engine.device.management_server.password, "hunter2");
        let map = engine.device.parameter_map();
        assert_eq!(
            map.get("Device.ManagementServer.Username").map(String::as_str),
            Some("cpe-1")
        );
    }

    #[tokio::test]
    async fn inform_envelope_header_id_is_the_serial() {
        let mut engine = engine();
        let inform = engine
            .build_inform(vec![EventStruct::new("2 PERIODIC")])
            .await;
        let serial = inform.device_id.serial_number.clone();
        let envelope = RequestEnvelope::builder()
            .id(serial)
            .body(RequestBody::Inform(inform))
            .build();
        let xml = envelope.to_xml();
        assert!(xml.contains(r#"<cwmp:ID soap-env:mustUnderstand="1">SN1</cwmp:ID>"#));
        assert!(xml.contains("<SerialNumber>SN1</SerialNumber>"));
        assert!(xml.contains("<EventCode>2 PERIODIC</EventCode>"));
    }

    #[test]
    fn engine_starts_idle() {
        assert_eq!(engine().state(), SessionState::Idle);
    }

    #[test]
    fn session_states_have_names() {
        for (state, name) in [
            (SessionState::Idle, "Idle"),
            (SessionState::Connecting, "Connecting"),
            (SessionState::Informing, "Informing"),
            (SessionState::Dispatching, "Dispatching"),
            (SessionState::Closing, "Closing"),
            (SessionState::Backoff, "Backoff"),
        ] {
            assert_eq!(state.state_name(), name);
        }
    }
}
