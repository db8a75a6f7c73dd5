//! Emit/parse round trips for CPE→ACS envelopes.

use cwmp_soap::request::*;
use cwmp_soap::value::{ParameterValue, TypedValue, XsdType};
use cwmp_soap::{CwmpTime, RequestEnvelope};

fn roundtrip(envelope: &RequestEnvelope) -> RequestEnvelope {
    let xml = envelope.to_xml();
    RequestEnvelope::from_xml(&xml)
        .unwrap_or_else(|e| panic!("failed to reparse emitted envelope: {e}\n{xml}"))
}

fn sample_inform() -> RequestEnvelope {
    RequestEnvelope::builder()
        .id("SN1")
        .body(RequestBody::Inform(
            Inform::builder()
                .device_id(
                    DeviceId::builder()
                        .manufacturer("MikroTik")
                        .oui("4C5E0C")
                        .product_class("RB952Ui-5ac2nD")
                        .serial_number("SN1")
                        .build(),
                )
                .events(vec![EventStruct::new("2 PERIODIC")])
                .current_time(CwmpTime::parse("2024-05-01T12:30:45Z").unwrap())
                .parameter_list(vec![
                    ParameterValue::new(
                        "Device.DeviceInfo.Manufacturer",
                        TypedValue::string("MikroTik"),
                    ),
                    ParameterValue::new(
                        "Device.ManagementServer.PeriodicInformEnable",
                        TypedValue::typed(XsdType::Boolean, "true"),
                    ),
                    ParameterValue::new(
                        "Device.DeviceInfo.UpTime",
                        TypedValue::typed(XsdType::UnsignedInt, "456"),
                    ),
                ])
                .build(),
        ))
        .build()
}

#[test]
fn inform_roundtrips() {
    let envelope = sample_inform();
    assert_eq!(roundtrip(&envelope), envelope);
}

#[test]
fn inform_envelope_has_cwmp_shape() {
    let xml = sample_inform().to_xml();
    assert!(xml.contains(r#"xmlns:cwmp="urn:dslforum-org:cwmp-1-2""#));
    assert!(xml.contains(r#"<cwmp:ID soap-env:mustUnderstand="1">SN1</cwmp:ID>"#));
    assert!(xml.contains("<EventCode>2 PERIODIC</EventCode>"));
    assert!(xml.contains(r#"<Value xsi:type="xsd:boolean">true</Value>"#));
}

#[test]
fn transfer_complete_roundtrips() {
    let envelope = RequestEnvelope::builder()
        .id("SN1")
        .body(RequestBody::TransferComplete(TransferComplete {
            command_key: "fw-42".to_owned(),
            fault_code: 0,
            fault_string: String::new(),
            start_time: CwmpTime::parse("2024-05-01T12:00:00Z").unwrap(),
            complete_time: CwmpTime::parse("2024-05-01T12:03:21Z").unwrap(),
        }))
        .build();
    assert_eq!(roundtrip(&envelope), envelope);
}

#[test]
fn rpc_method_responses_roundtrip() {
    let bodies = vec![
        RequestBody::GetRPCMethodsResponse(GetRPCMethodsResponse {
            methods: vec![
                "GetParameterValues".to_owned(),
                "SetParameterValues".to_owned(),
                "Reboot".to_owned(),
            ],
        }),
        RequestBody::SetParameterValuesResponse(SetParameterValuesResponse { status: 0 }),
        RequestBody::GetParameterNamesResponse(GetParameterNamesResponse {
            parameters: vec![
                ParameterInfo {
                    name: "Device.DeviceInfo.".to_owned(),
                    writable: false,
                },
                ParameterInfo {
                    name: "Device.ManagementServer.".to_owned(),
                    writable: true,
                },
            ],
        }),
        RequestBody::AddObjectResponse(AddObjectResponse {
            instance_number: 3,
            status: 0,
        }),
        RequestBody::DeleteObjectResponse(DeleteObjectResponse { status: 0 }),
        RequestBody::RebootResponse,
        RequestBody::FactoryResetResponse,
        RequestBody::DownloadResponse(DownloadResponse {
            status: 1,
            start_time: CwmpTime::parse("2024-05-01T12:00:00Z").unwrap(),
            complete_time: CwmpTime::parse("2024-05-01T12:00:00Z").unwrap(),
        }),
        RequestBody::GetParameterValuesResponse(GetParameterValuesResponse {
            parameters: vec![ParameterValue::new(
                "Device.Hosts.HostNumberOfEntries",
                TypedValue::typed(XsdType::UnsignedInt, "2"),
            )],
        }),
        RequestBody::RequestDownload(RequestDownload {
            file_type: "1 Firmware Upgrade Image".to_owned(),
            file_size: 8_388_608,
            target_file_name: "fw.bin".to_owned(),
        }),
        RequestBody::ScheduleInform(ScheduleInform {
            delay_seconds: 30,
            command_key: "later".to_owned(),
        }),
        RequestBody::GetOptions(GetOptions {
            option_name: "option".to_owned(),
        }),
        RequestBody::SetVouchers(SetVouchers {
            vouchers: vec!["AAAA".to_owned(), "BBBB".to_owned()],
        }),
    ];

    for body in bodies {
        let envelope = RequestEnvelope::builder().id("SN1").body(body).build();
        assert_eq!(roundtrip(&envelope), envelope, "{}", envelope.body.method_name());
    }
}

#[test]
fn fault_body_carries_tr069_detail() {
    let envelope = RequestEnvelope::builder()
        .id("SN1")
        .body(RequestBody::Fault(cwmp_soap::CwmpFault::new(9008)))
        .build();
    let xml = envelope.to_xml();
    assert!(xml.contains("<FaultCode>9008</FaultCode>"));
    assert!(xml.contains("<FaultString>Attempt to set a non-writable parameter</FaultString>"));
    assert_eq!(roundtrip(&envelope), envelope);
}
