//! Parsing of ACS→CPE envelopes, including the malformed cases.

use cwmp_soap::response::{ResponseBody, ResponseEnvelope};
use cwmp_soap::{SoapError, XsdType};

const NS: &str = r#"xmlns:soap-env="http://schemas.xmlsoap.org/soap/envelope/" xmlns:cwmp="urn:dslforum-org:cwmp-1-2" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:xsd="http://www.w3.org/2001/XMLSchema""#;

fn envelope(body: &str) -> String {
    format!(
        r#"<soap-env:Envelope {NS}>
  <soap-env:Header>
    <cwmp:ID soap-env:mustUnderstand="1">session-7</cwmp:ID>
  </soap-env:Header>
  <soap-env:Body>{body}</soap-env:Body>
</soap-env:Envelope>"#
    )
}

#[test]
fn parses_inform_response() {
    let xml = envelope("<cwmp:InformResponse><MaxEnvelopes>1</MaxEnvelopes></cwmp:InformResponse>");
    let parsed = ResponseEnvelope::from_xml(&xml).unwrap();
    assert_eq!(parsed.id.as_deref(), Some("session-7"));
    assert!(parsed.must_understand);
    assert_eq!(parsed.body.method_name(), "InformResponse");
    let ResponseBody::InformResponse(ir) = parsed.body else {
        panic!("wrong variant");
    };
    assert_eq!(ir.max_envelopes, 1);
}

#[test]
fn parses_set_parameter_values_with_typed_values() {
    let xml = envelope(
        r#"<cwmp:SetParameterValues>
  <ParameterList>
    <ParameterValueStruct>
      <Name>Device.ManagementServer.PeriodicInformInterval</Name>
      <Value xsi:type="xsd:unsignedInt">60</Value>
    </ParameterValueStruct>
    <ParameterValueStruct>
      <Name>Device.ManagementServer.PeriodicInformEnable</Name>
      <Value xsi:type="xsd:boolean">1</Value>
    </ParameterValueStruct>
  </ParameterList>
  <ParameterKey>commit-9</ParameterKey>
</cwmp:SetParameterValues>"#,
    );
    let parsed = ResponseEnvelope::from_xml(&xml).unwrap();
    let ResponseBody::SetParameterValues(spv) = parsed.body else {
        panic!("wrong variant");
    };
    assert_eq!(spv.parameter_key, "commit-9");
    assert_eq!(spv.parameters.len(), 2);
    assert_eq!(spv.parameters[0].value.xsd, XsdType::UnsignedInt);
    assert_eq!(spv.parameters[1].value.render(), "true");
}

#[test]
fn parses_get_parameter_values_names() {
    let xml = envelope(
        r#"<cwmp:GetParameterValues>
  <ParameterNames soap-env:arrayType="xsd:string[2]">
    <string>Device.DeviceInfo.</string>
    <string>Device.WiFi.</string>
  </ParameterNames>
</cwmp:GetParameterValues>"#,
    );
    let ResponseBody::GetParameterValues(gpv) = ResponseEnvelope::from_xml(&xml).unwrap().body
    else {
        panic!("wrong variant");
    };
    assert_eq!(
        gpv.parameter_names,
        vec!["Device.DeviceInfo.".to_owned(), "Device.WiFi.".to_owned()]
    );
}

#[test]
fn parses_download_and_vendor_command() {
    let xml = envelope(
        r#"<cwmp:Download>
  <CommandKey>fw-1</CommandKey>
  <FileType>1 Firmware Upgrade Image</FileType>
  <URL>https://acs.example.com/fw.bin</URL>
  <FileSize>8388608</FileSize>
  <TargetFileName>fw.bin</TargetFileName>
  <DelaySeconds>0</DelaySeconds>
</cwmp:Download>"#,
    );
    let ResponseBody::Download(download) = ResponseEnvelope::from_xml(&xml).unwrap().body else {
        panic!("wrong variant");
    };
    assert_eq!(download.url, "https://acs.example.com/fw.bin");
    assert_eq!(download.file_size, Some(8_388_608));
    assert!(download.username.is_none());

    let xml = envelope(
        r#"<cwmp:X_Command>
  <CommandKey>xc-1</CommandKey>
  <cwmp:Parameters><Command>cat /proc/uptime</Command></cwmp:Parameters>
</cwmp:X_Command>"#,
    );
    let ResponseBody::XCommand(xc) = ResponseEnvelope::from_xml(&xml).unwrap().body else {
        panic!("wrong variant");
    };
    assert_eq!(xc.command, "cat /proc/uptime");
}

#[test]
fn empty_body_is_malformed() {
    let xml = envelope("");
    assert!(matches!(
        ResponseEnvelope::from_xml(&xml),
        Err(SoapError::MalformedEnvelope(_))
    ));
}

#[test]
fn two_bodies_are_malformed() {
    let xml = envelope("<cwmp:GetRPCMethods/><cwmp:Reboot/>");
    assert!(matches!(
        ResponseEnvelope::from_xml(&xml),
        Err(SoapError::MalformedEnvelope(_))
    ));
}

#[test]
fn truncated_xml_is_malformed() {
    let xml = "<soap-env:Envelope><soap-env:Body>";
    assert!(ResponseEnvelope::from_xml(xml).is_err());
}

#[test]
fn bad_datetime_value_is_malformed() {
    let xml = envelope(
        r#"<cwmp:SetParameterValues>
  <ParameterList>
    <ParameterValueStruct>
      <Name>Device.DeviceInfo.X_ISPAPP_AutosupoutTime</Name>
      <Value xsi:type="xsd:dateTime">yesterday-ish</Value>
    </ParameterValueStruct>
  </ParameterList>
  <ParameterKey/>
</cwmp:SetParameterValues>"#,
    );
    assert!(matches!(
        ResponseEnvelope::from_xml(&xml),
        Err(SoapError::InvalidDateTime(_))
    ));
}

#[test]
fn fault_response_carries_detail() {
    let xml = envelope(
        r#"<soap-env:Fault>
  <faultcode>Client</faultcode>
  <faultstring>CWMP fault</faultstring>
  <detail>
    <cwmp:Fault>
      <FaultCode>8005</FaultCode>
      <FaultString>Retry request</FaultString>
    </cwmp:Fault>
  </detail>
</soap-env:Fault>"#,
    );
    let ResponseBody::Fault(fault) = ResponseEnvelope::from_xml(&xml).unwrap().body else {
        panic!("wrong variant");
    };
    assert_eq!(fault.fault_code, "Client");
    assert_eq!(fault.detail_code, Some(8005));
}
