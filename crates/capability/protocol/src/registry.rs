//! 静态 DataID 描述符表。
//!
//! 每个条目给出：展开后的字段名列表、高/低字节槽位的标量类型、
//! 与展开字段一一对应的人类可读描述。未收录的 DataID 解码为空结果。
//!
//! 对齐约束：字段名与描述数量必须等于类型对展开后的名槽总数
//! （flag8 占 8 槽、u8wdt 占 2 槽、数值类型占 1 槽、none 占 0 槽），
//! 由 `registry_entries_are_aligned` 测试保障。

use std::collections::HashMap;
use std::sync::OnceLock;

use domain::ScalarType;
use domain::ScalarType::{Flag8, None, F8_8, S16, S8, U16, U8, U8Wdt};

/// 单个 DataID 的解码描述符。
#[derive(Debug)]
pub struct FieldDescriptor {
    pub names: &'static [&'static str],
    pub high: ScalarType,
    pub low: ScalarType,
    pub descriptions: &'static [&'static str],
}

impl FieldDescriptor {
    /// 类型对展开后占用的名槽总数。
    pub fn expanded_slots(&self) -> usize {
        slots(self.high) + slots(self.low)
    }
}

fn slots(ty: ScalarType) -> usize {
    match ty {
        None => 0,
        Flag8 => 8,
        U8Wdt => 2,
        U8 | S8 | F8_8 | U16 | S16 => 1,
    }
}

/// 按 DataID 查描述符。
pub fn descriptor(data_id: u8) -> Option<&'static FieldDescriptor> {
    registry().get(&data_id)
}

/// 已收录的全部 DataID（测试用途）。
pub fn known_data_ids() -> Vec<u8> {
    let mut ids: Vec<u8> = registry().keys().copied().collect();
    ids.sort_unstable();
    ids
}

static REGISTRY: OnceLock<HashMap<u8, FieldDescriptor>> = OnceLock::new();

fn registry() -> &'static HashMap<u8, FieldDescriptor> {
    REGISTRY.get_or_init(|| {
        HashMap::from([
            (
                0u8,
                FieldDescriptor {
                    names: &[
                        "ch_enabled",
                        "dhw_enabled",
                        "cooling_enabled",
                        "otc_active",
                        "ch2_enabled",
                        "reserved1",
                        "reserved2",
                        "reserved3",
                        "fault_indication",
                        "ch_active",
                        "dhw_active",
                        "flame_active",
                        "cooling_active",
                        "ch2_active",
                        "diagnostic_event",
                        "reserved4",
                    ],
                    high: Flag8,
                    low: Flag8,
                    descriptions: &[
                        "CH enable",
                        "DHW enable",
                        "Cooling enable",
                        "OTC active",
                        "CH2 enable",
                        "reserved",
                        "reserved",
                        "reserved",
                        "Fault indication",
                        "CH mode",
                        "DHW mode",
                        "Flame status",
                        "Cooling status",
                        "CH2 mode",
                        "Diagnostic Event",
                        "reserved",
                    ],
                },
            ),
            (
                1,
                FieldDescriptor {
                    names: &["control_setpoint"],
                    high: F8_8,
                    low: None,
                    descriptions: &[
                        "Temperature setpoint for the supply from the boiler in degrees C",
                    ],
                },
            ),
            (
                2,
                FieldDescriptor {
                    names: &["master_configuration"],
                    high: None,
                    low: U8,
                    descriptions: &["MemberID code of the master"],
                },
            ),
            (
                3,
                FieldDescriptor {
                    names: &[
                        "dhw_present",
                        "control_type",
                        "cooling_supported",
                        "dhw_storage_tank_present",
                        "master_control_allowed",
                        "ch2_present",
                        "reserved",
                        "reserved",
                        "slave_memberID",
                    ],
                    high: Flag8,
                    low: U8,
                    descriptions: &[
                        "DHW present [ dhw not present, dhw is present ]",
                        "Control type [ modulating, on/off ]",
                        "Cooling config [ cooling not supported, cooling supported]",
                        "DHW config [instantaneous or not-specified, storage tank]",
                        "Master low-off&pump control function [allowed, not allowed]",
                        "CH2 present [CH2 not present, CH2 present]",
                        "reserved",
                        "reserved",
                        "MemberID code of the slave",
                    ],
                },
            ),
            (
                5,
                FieldDescriptor {
                    names: &[
                        "service_required",
                        "remote_reset_enabled",
                        "low_water_pressure_fault",
                        "gas_flame_fault",
                        "air_pressure_fault",
                        "water_over_temperture_fault",
                        "reserved",
                        "reserved",
                        "oem_fault_code",
                    ],
                    high: Flag8,
                    low: U8,
                    descriptions: &[
                        "Service request [service not req’d, service required]",
                        "Lockout-reset [ remote reset disabled, rr enabled]",
                        "Low water press [no WP fault, water pressure fault]",
                        "Gas/flame fault [ no G/F fault, gas/flame fault ]",
                        "Air press fault [ no AP fault, air pressure fault ]",
                        "Water over-temp[no OvT fault, over-temperat. Fault]",
                        "reserved",
                        "reserved",
                        "OEM fault code u8 0..255 An OEM-specific fault/error code",
                    ],
                },
            ),
            (
                7,
                FieldDescriptor {
                    names: &["cooling_control_signal"],
                    high: F8_8,
                    low: None,
                    descriptions: &["Signal for cooling plant"],
                },
            ),
            (
                8,
                FieldDescriptor {
                    names: &["control_setpoint_2"],
                    high: F8_8,
                    low: None,
                    descriptions: &[
                        "Temperature setpoint for the supply from the boiler for circuit 2 in degrees C",
                    ],
                },
            ),
            (
                9,
                FieldDescriptor {
                    names: &["remote_override_room_setpoint"],
                    high: F8_8,
                    low: None,
                    descriptions: &["Remote override room setpoint (0 = No override)"],
                },
            ),
            (
                10,
                FieldDescriptor {
                    names: &["number_of_tsps"],
                    high: U8,
                    low: None,
                    descriptions: &[
                        "Number of transparent-slave-parameter supported by the slave device",
                    ],
                },
            ),
            (
                11,
                FieldDescriptor {
                    names: &["tsp_index", "tsp_value"],
                    high: U8,
                    low: U8,
                    descriptions: &["Index number of following TSP", "Value of above referenced TSP"],
                },
            ),
            (
                12,
                FieldDescriptor {
                    names: &["size_of_fault_buffer"],
                    high: U8,
                    low: None,
                    descriptions: &["The size of the fault history buffer"],
                },
            ),
            (
                13,
                FieldDescriptor {
                    names: &["fhb_fault_index", "fhb_fault_value"],
                    high: U8,
                    low: U8,
                    descriptions: &[
                        "Index number of following Fault Buffer entry",
                        "Value of above referenced Fault Buffer entry",
                    ],
                },
            ),
            (
                14,
                FieldDescriptor {
                    names: &["maximum_relative_modulation_level_setting"],
                    high: F8_8,
                    low: None,
                    descriptions: &[
                        "Maximum relative boiler modulation level setting for sequencer and off-low&pump control applications (%)",
                    ],
                },
            ),
            (
                15,
                FieldDescriptor {
                    names: &["maximum_boiler_capacity", "minimum_boiler_modulation"],
                    high: U8,
                    low: U8,
                    descriptions: &["Maximum boiler capacity (kW)", "Minimum modulation level (%)"],
                },
            ),
            (
                16,
                FieldDescriptor {
                    names: &["room_setpoint"],
                    high: F8_8,
                    low: None,
                    descriptions: &["Current room temperature setpoint (°C)"],
                },
            ),
            (
                17,
                FieldDescriptor {
                    names: &["relative_modulation_level"],
                    high: F8_8,
                    low: None,
                    descriptions: &["Relative modulation level (%)"],
                },
            ),
            (
                18,
                FieldDescriptor {
                    names: &["ch_water_pressure"],
                    high: F8_8,
                    low: None,
                    descriptions: &["Water pressure of the boiler CH circuit (bar)"],
                },
            ),
            (
                19,
                FieldDescriptor {
                    names: &["dhw_flow_rate"],
                    high: F8_8,
                    low: None,
                    descriptions: &["Water flow rate through the DHW circuit (l/min)"],
                },
            ),
            (
                20,
                FieldDescriptor {
                    names: &["weekday", "hour", "minutes"],
                    high: U8Wdt,
                    low: U8,
                    descriptions: &["Day of the week (1=Monday)", "Hours", "Minutes"],
                },
            ),
            (
                21,
                FieldDescriptor {
                    names: &["month", "day"],
                    high: U8,
                    low: U8,
                    descriptions: &["Month", "Day of Month"],
                },
            ),
            (
                22,
                FieldDescriptor {
                    names: &["year"],
                    high: U16,
                    low: None,
                    descriptions: &["Year"],
                },
            ),
            (
                23,
                FieldDescriptor {
                    names: &["room_setpoint_ch2"],
                    high: F8_8,
                    low: None,
                    descriptions: &["Current room setpoint for 2nd CH circuit (°C)"],
                },
            ),
            (
                24,
                FieldDescriptor {
                    names: &["room_temperature"],
                    high: F8_8,
                    low: None,
                    descriptions: &["Current sensed room temperature (°C)"],
                },
            ),
            (
                25,
                FieldDescriptor {
                    names: &["boiler_water_temp"],
                    high: F8_8,
                    low: None,
                    descriptions: &["Flow water temperature from boiler (°C)"],
                },
            ),
            (
                26,
                FieldDescriptor {
                    names: &["dhw_temperature"],
                    high: F8_8,
                    low: None,
                    descriptions: &["Domestic hot water temperature (°C)"],
                },
            ),
            (
                27,
                FieldDescriptor {
                    names: &["outside_temperature"],
                    high: F8_8,
                    low: None,
                    descriptions: &["Outside air temperature (°C)"],
                },
            ),
            (
                28,
                FieldDescriptor {
                    names: &["return_water_temperature"],
                    high: F8_8,
                    low: None,
                    descriptions: &["Return water temperature to boiler (°C)"],
                },
            ),
            (
                29,
                FieldDescriptor {
                    names: &["solar_storage_temperature"],
                    high: F8_8,
                    low: None,
                    descriptions: &["Solar storage temperature (°C)"],
                },
            ),
            (
                30,
                FieldDescriptor {
                    names: &["solar_collector_temperature"],
                    high: S16,
                    low: None,
                    descriptions: &["Solar collector temperature (°C)"],
                },
            ),
            (
                31,
                FieldDescriptor {
                    names: &["flow_temperature_ch2"],
                    high: F8_8,
                    low: None,
                    descriptions: &["Flow water temperature of the second central heating circuit"],
                },
            ),
            (
                32,
                FieldDescriptor {
                    names: &["dhw2_temperature"],
                    high: F8_8,
                    low: None,
                    descriptions: &["Domestic hot water temperature 2 (°C)"],
                },
            ),
            (
                33,
                FieldDescriptor {
                    names: &["exhaust_temperature"],
                    high: S16,
                    low: None,
                    descriptions: &["Exhaust temperature (°C)"],
                },
            ),
            (
                48,
                FieldDescriptor {
                    names: &["dhwsetpoint_upper_bound", "dhwsetpoint_lower_bound"],
                    high: S8,
                    low: S8,
                    descriptions: &[
                        "Upper bound for adjustment of DHW setp (°C)",
                        "Lower bound for adjustment of DHW setp (°C)",
                    ],
                },
            ),
            (
                49,
                FieldDescriptor {
                    names: &["max_chsetp_upper_bound", "max_chsetp_lower_bound"],
                    high: S8,
                    low: S8,
                    descriptions: &[
                        "Upper bound for adjustment of maxCHsetp (°C)",
                        "Lower bound for adjustment of maxCHsetp (°C)",
                    ],
                },
            ),
            (
                56,
                FieldDescriptor {
                    names: &["dhw_setpoint"],
                    high: F8_8,
                    low: None,
                    descriptions: &["Domestic hot water temperature setpoint (°C)"],
                },
            ),
            (
                57,
                FieldDescriptor {
                    names: &["max_ch_water_setpoint"],
                    high: F8_8,
                    low: None,
                    descriptions: &["Maximum allowable CH water setpoint (°C)"],
                },
            ),
            (
                100,
                FieldDescriptor {
                    names: &[
                        "manual_setpoint_overrules_remote_setpoint",
                        "program_change_setpoint_overrides_remote_setpoint",
                        "reserved",
                        "reserved",
                        "reserved",
                        "reserved",
                        "reserved",
                        "reserved",
                    ],
                    high: None,
                    low: Flag8,
                    descriptions: &[
                        "Manual change priority [0 = disable overruling remote setpoint by manual setpoint change, 1 = enable overruling remote setpoint by manual setpoint change]",
                        "Program change priority [0 = disable overruling remote setpoint by program setpoint change, 1 = enable overruling remote setpoint by program setpoint change]",
                        "reserved",
                        "reserved",
                        "reserved",
                        "reserved",
                        "reserved",
                        "reserved",
                    ],
                },
            ),
            (
                115,
                FieldDescriptor {
                    names: &["oem_diagnostic_code"],
                    high: U16,
                    low: None,
                    descriptions: &["OEM-specific diagnostic/service code"],
                },
            ),
            (
                116,
                FieldDescriptor {
                    names: &["burner_starts"],
                    high: U16,
                    low: None,
                    descriptions: &["Number of starts burner"],
                },
            ),
            (
                117,
                FieldDescriptor {
                    names: &["ch_pump_starts"],
                    high: U16,
                    low: None,
                    descriptions: &["Number of starts CH pump"],
                },
            ),
            (
                118,
                FieldDescriptor {
                    names: &["dhw_pump/valve_starts"],
                    high: U16,
                    low: None,
                    descriptions: &["Number of starts DHW pump/valve"],
                },
            ),
            (
                119,
                FieldDescriptor {
                    names: &["dhw_burner_starts"],
                    high: U16,
                    low: None,
                    descriptions: &["Number of starts burner in DHW mode"],
                },
            ),
            (
                120,
                FieldDescriptor {
                    names: &["burner_operation_hours"],
                    high: U16,
                    low: None,
                    descriptions: &["Number of hours that burner is in operation (i.e.flame on)"],
                },
            ),
            (
                121,
                FieldDescriptor {
                    names: &["ch_pump_operation_hours"],
                    high: U16,
                    low: None,
                    descriptions: &["Number of hours that CH pump has been running"],
                },
            ),
            (
                122,
                FieldDescriptor {
                    names: &["dhw_pump/valve_operation_hours"],
                    high: U16,
                    low: None,
                    descriptions: &[
                        "Number of hours that DHW pump has been running or DHW valve has been opened",
                    ],
                },
            ),
            (
                123,
                FieldDescriptor {
                    names: &["dhw_burner_operation_hours"],
                    high: U16,
                    low: None,
                    descriptions: &[
                        "Number of hours that burner is in operation during DHW mode",
                    ],
                },
            ),
            (
                124,
                FieldDescriptor {
                    names: &["opentherm_version_master"],
                    high: F8_8,
                    low: None,
                    descriptions: &[
                        "The implemented version of the OpenTherm Protocol Specification in the master",
                    ],
                },
            ),
            (
                125,
                FieldDescriptor {
                    names: &["opentherm_version_slave"],
                    high: F8_8,
                    low: None,
                    descriptions: &[
                        "The implemented version of the OpenTherm Protocol Specification in the slave",
                    ],
                },
            ),
            (
                126,
                FieldDescriptor {
                    names: &["master_product_version_number", "master_product_type"],
                    high: U8,
                    low: U8,
                    descriptions: &[
                        "The master device product version number as defined by the manufacturer",
                        "The master device product type as defined by the manufacturer",
                    ],
                },
            ),
            (
                127,
                FieldDescriptor {
                    names: &["slave_product_version_number", "slave_product_type"],
                    high: U8,
                    low: U8,
                    descriptions: &[
                        "The slave device product version number as defined by the manufacturer",
                        "The slave device product type as defined by the manufacturer",
                    ],
                },
            ),
        ])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_entries_are_aligned() {
        // 对齐约束：名/描述数量 == 类型对展开后的名槽总数
        for id in known_data_ids() {
            let desc = descriptor(id).unwrap();
            assert_eq!(
                desc.names.len(),
                desc.expanded_slots(),
                "descriptor {} has misaligned field names",
                id
            );
            assert_eq!(
                desc.descriptions.len(),
                desc.names.len(),
                "descriptor {} has misaligned descriptions",
                id
            );
        }
    }

    #[test]
    fn unknown_data_id_has_no_descriptor() {
        assert!(descriptor(4).is_none());
        assert!(descriptor(99).is_none());
        assert!(descriptor(255).is_none());
    }

    #[test]
    fn registry_covers_all_supported_data_ids() {
        let ids = known_data_ids();
        assert_eq!(ids.len(), 50);
        assert!(ids.contains(&0));
        assert!(ids.contains(&25));
        assert!(ids.contains(&127));
    }
}
