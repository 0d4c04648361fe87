//! 提交前的草稿驗證與 `client_ip` 合成。
//!
//! 所有規則獨立執行，不提早中止，一次回傳完整的 [`ErrorMap`]。

use crate::domain::model::{
    AddressList, CircuitRecord, ErrorMap, Field, FieldKey, IpAddressConfig, IpMode,
};
use crate::utils::validation::{is_blank, is_dotted_quad, is_integer_in_range};

pub const VLAN_MIN: i64 = 1;
pub const VLAN_MAX: i64 = 4094;

/// 編輯與註冊共用的必填欄位
const REQUIRED_FIELDS: [Field; 8] = [
    Field::CircuitId,
    Field::ClientName,
    Field::Gateway,
    Field::Vlan,
    Field::Bandwidth,
    Field::Location,
    Field::MuxId,
    Field::PortId,
];

fn required_message(field: Field) -> String {
    format!("{} is required", field.label())
}

/// 驗證草稿。`ip_config` 為 `None` 表示編輯既有紀錄，此時 `client_ip` 為必填單一位址。
pub fn validate(draft: &CircuitRecord, ip_config: Option<&IpAddressConfig>) -> ErrorMap {
    let mut errors = ErrorMap::new();

    for field in REQUIRED_FIELDS {
        if is_blank(draft.get(field)) {
            errors.insert(field, required_message(field));
        }
    }

    if !is_blank(&draft.gateway) && !is_dotted_quad(&draft.gateway) {
        errors.insert(Field::Gateway, "Please enter a valid gateway IP address");
    }

    if !is_blank(&draft.vlan) && !is_integer_in_range(&draft.vlan, VLAN_MIN, VLAN_MAX) {
        errors.insert(
            Field::Vlan,
            format!("VLAN ID must be a number between {} and {}", VLAN_MIN, VLAN_MAX),
        );
    }

    let mode = ip_config.map(IpAddressConfig::mode).unwrap_or(IpMode::Single);
    if mode == IpMode::Single {
        check_client_ip(&draft.client_ip, &mut errors);
    }

    if let Some(config) = ip_config {
        for list in [AddressList::Lan, AddressList::Wan] {
            if mode.activates(list) {
                check_address_list(list, config.addresses(list), &mut errors);
            }
        }
    }

    errors
}

fn check_client_ip(value: &str, errors: &mut ErrorMap) {
    if is_blank(value) {
        errors.insert(Field::ClientIp, required_message(Field::ClientIp));
    } else if !is_dotted_quad(value) {
        errors.insert(Field::ClientIp, "Please enter a valid IP address");
    }
}

/// 每個無效項目各自產生一筆錯誤
fn check_address_list(list: AddressList, entries: &[String], errors: &mut ErrorMap) {
    for (index, entry) in entries.iter().enumerate() {
        let key = FieldKey::Indexed(list, index);
        if is_blank(entry) {
            errors.insert(key, format!("{} address is required", list.label()));
        } else if !is_dotted_quad(entry) {
            errors.insert(key, format!("Please enter a valid {} IP address", list.label()));
        }
    }
}

/// 依定址模式合成要寫入紀錄的 `client_ip`。空白項目在串接前濾除，順序不變。
pub fn project_client_ip(draft: &CircuitRecord, ip_config: &IpAddressConfig) -> String {
    let joined = |list: AddressList| {
        ip_config
            .addresses(list)
            .iter()
            .filter(|entry| !is_blank(entry))
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };

    match ip_config.mode() {
        IpMode::Single => draft.client_ip.clone(),
        IpMode::Lan => format!("LAN: {}", joined(AddressList::Lan)),
        IpMode::Wan => format!("WAN: {}", joined(AddressList::Wan)),
        IpMode::Both => format!(
            "LAN: {}, WAN: {}",
            joined(AddressList::Lan),
            joined(AddressList::Wan)
        ),
    }
}
