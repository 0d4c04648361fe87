use circuit_portal::adapters::memory::demo_circuits;
use circuit_portal::{
    project_client_ip, validate, AddressList, CircuitRecord, Field, FieldKey, IpAddressConfig,
    IpMode,
};

fn blank_registration() -> CircuitRecord {
    let mut draft = CircuitRecord::registration_defaults();
    draft.circuit_id = "CIR-900-DEN".to_string();
    draft.client_name = "Front Range Clinics".to_string();
    draft.gateway = "10.9.0.1".to_string();
    draft.vlan = "900".to_string();
    draft.bandwidth = "50 Mbps".to_string();
    draft.location = "Denver, CO".to_string();
    draft.mux_id = "MUX-DEN-004".to_string();
    draft.port_id = "PORT-17".to_string();
    draft
}

fn list(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// 所有示範電路本身就是合法的草稿
#[test]
fn test_demo_circuits_are_valid_edit_drafts() {
    for circuit in demo_circuits() {
        let errors = validate(&circuit, None);
        assert!(errors.is_empty(), "{}: {:?}", circuit.service_number, errors);
    }
}

#[test]
fn test_vlan_boundaries() {
    for (vlan, ok) in [
        ("1", true),
        ("4094", true),
        ("2048", true),
        ("0", false),
        ("4095", false),
        ("abc", false),
        ("", false),
    ] {
        let mut draft = demo_circuits()[0].clone();
        draft.vlan = vlan.to_string();
        let errors = validate(&draft, None);
        assert_eq!(
            !errors.contains(&FieldKey::Named(Field::Vlan)),
            ok,
            "vlan {:?}",
            vlan
        );
    }
}

#[test]
fn test_valid_registration_in_every_mode() {
    let draft = {
        let mut d = blank_registration();
        d.client_ip = "10.9.0.20".to_string();
        d
    };
    let configs = [
        IpAddressConfig::new(IpMode::Single),
        IpAddressConfig::with_addresses(IpMode::Lan, list(&["10.9.0.20", "10.9.0.21"]), vec![]),
        IpAddressConfig::with_addresses(IpMode::Wan, vec![], list(&["198.51.100.4"])),
        IpAddressConfig::with_addresses(
            IpMode::Both,
            list(&["10.9.0.20"]),
            list(&["198.51.100.4"]),
        ),
    ];

    for config in &configs {
        let errors = validate(&draft, Some(config));
        assert!(errors.is_empty(), "mode {}: {:?}", config.mode(), errors);
    }
}

#[test]
fn test_single_mode_requires_client_ip() {
    let draft = blank_registration();
    let errors = validate(&draft, Some(&IpAddressConfig::new(IpMode::Single)));

    assert_eq!(errors.len(), 1);
    assert_eq!(errors.field(Field::ClientIp), Some("Client IP is required"));
}

#[test]
fn test_inactive_list_is_ignored() {
    let draft = blank_registration();
    let config = IpAddressConfig::with_addresses(
        IpMode::Wan,
        list(&["definitely not an address"]),
        list(&["198.51.100.4"]),
    );

    assert!(validate(&draft, Some(&config)).is_empty());
}

#[test]
fn test_validate_is_deterministic() {
    let mut draft = blank_registration();
    draft.gateway = "10.9.0".to_string();
    let config = IpAddressConfig::with_addresses(IpMode::Both, list(&["", "x"]), list(&[""]));

    let first = validate(&draft, Some(&config));
    let second = validate(&draft, Some(&config));

    assert_eq!(first, second);
    assert_eq!(first.len(), 4);
    assert!(first.contains(&FieldKey::Indexed(AddressList::Lan, 0)));
    assert!(first.contains(&FieldKey::Indexed(AddressList::Lan, 1)));
    assert!(first.contains(&FieldKey::Indexed(AddressList::Wan, 0)));
    assert!(first.contains(&FieldKey::Named(Field::Gateway)));
}

#[test]
fn test_projection_preserves_order_and_skips_blanks() {
    let draft = blank_registration();
    let config = IpAddressConfig::with_addresses(
        IpMode::Both,
        list(&["10.0.0.1", ""]),
        list(&["203.0.113.5"]),
    );

    assert_eq!(
        project_client_ip(&draft, &config),
        "LAN: 10.0.0.1, WAN: 203.0.113.5"
    );

    let config = IpAddressConfig::with_addresses(
        IpMode::Lan,
        list(&["10.0.0.3", "", "10.0.0.1"]),
        vec![],
    );
    assert_eq!(project_client_ip(&draft, &config), "LAN: 10.0.0.3, 10.0.0.1");
}

#[test]
fn test_error_map_serializes_with_composite_keys() {
    let draft = blank_registration();
    let config = IpAddressConfig::with_addresses(IpMode::Lan, list(&["10.0.0.1", "bad"]), vec![]);

    let errors = validate(&draft, Some(&config));
    let json = serde_json::to_value(&errors).unwrap();

    assert_eq!(json["lanAddress#1"], "Please enter a valid LAN IP address");
}

#[test]
fn test_non_ascii_digits_are_not_dotted_quads() {
    let mut draft = demo_circuits()[0].clone();
    draft.gateway = "١٩٢.١٦٨.١.١".to_string();
    draft.client_ip = "１９２.１６８.１.１".to_string();

    let errors = validate(&draft, None);

    assert_eq!(
        errors.field(Field::Gateway),
        Some("Please enter a valid gateway IP address")
    );
    assert_eq!(errors.field(Field::ClientIp), Some("Please enter a valid IP address"));

    let config = IpAddressConfig::with_addresses(IpMode::Lan, list(&["10.0.0.١"]), vec![]);
    let errors = validate(&blank_registration(), Some(&config));
    assert!(errors.contains(&FieldKey::Indexed(AddressList::Lan, 0)));
}
