//! Lua command construction and value coercion.
//!
//! Everything the CLU receives is a small Lua expression submitted through
//! the HAlistener endpoint: reads are `{"status": "<expr>"}` bodies, writes
//! are `{"command": "<expr>"}`. The builders here are pure string
//! construction; the round trip itself lives in `gateway`.

use serde::Deserialize;

use crate::address::{GrentonId, ObjectRef};

/// Gateway sub-type of a sensor object. Selects the accessor index used
/// when reading an indexed module. Unknown strings fall back to the
/// default sensor (index 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum GrentonType {
    #[default]
    DefaultSensor,
    Modbus,
    ModbusValue,
    ModbusRtu,
    ModbusClient,
    ModbusServer,
    ModbusSlaveRtu,
}

impl From<String> for GrentonType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "MODBUS" => Self::Modbus,
            "MODBUS_VALUE" => Self::ModbusValue,
            "MODBUS_RTU" => Self::ModbusRtu,
            "MODBUS_CLIENT" => Self::ModbusClient,
            "MODBUS_SERVER" => Self::ModbusServer,
            "MODBUS_SLAVE_RTU" => Self::ModbusSlaveRtu,
            _ => Self::DefaultSensor,
        }
    }
}

impl GrentonType {
    /// Accessor index passed to the module's generic `get(i)` call.
    pub fn accessor_index(self) -> u32 {
        match self {
            Self::DefaultSensor => 0,
            Self::Modbus => 14,
            Self::ModbusValue => 20,
            Self::ModbusRtu => 22,
            Self::ModbusClient => 19,
            Self::ModbusServer => 10,
            Self::ModbusSlaveRtu => 10,
        }
    }
}

/// Light capability, decided once from the object-reference prefix at
/// construction. LED outputs take their level through `execute` rather
/// than `set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    OnOff,
    Dimmable,
    Rgb,
}

impl LightKind {
    pub fn of(id: &GrentonId) -> Self {
        let object = id.object_or_full();
        if object.starts_with("DIM") {
            Self::Dimmable
        } else if object.starts_with("LED") {
            Self::Rgb
        } else {
            Self::OnOff
        }
    }
}

/// Read expression for sensor-style objects, dispatched on the identifier
/// shape: bare variable, indexed module (accessor index from the sub-type
/// table), or named variable on the CLU.
pub fn read_expression(id: &GrentonId, grenton_type: GrentonType) -> String {
    match id.object_ref() {
        ObjectRef::LocalVariable(name) => format!("return getVar(\"{name}\")"),
        ObjectRef::IndexedModule { clu, module } => {
            format!(
                "return {clu}:execute(0, '{module}:get({})')",
                grenton_type.accessor_index()
            )
        }
        ObjectRef::ModuleVariable { clu, name } => {
            format!("return {clu}:execute(0, 'getVar(\"{name}\")')")
        }
    }
}

/// Read expression for lights and switches: the full identifier plus
/// `:get(0)`, answered in the `object_value` reply field.
pub fn output_status_expression(id: &GrentonId) -> String {
    format!("{id}:get(0)")
}

/// Write expression for turning a light on. Dimmable and RGB kinds carry
/// the brightness as a 0.0–1.0 fraction; a missing brightness means full.
pub fn turn_on_expression(id: &GrentonId, kind: LightKind, brightness: Option<u8>) -> String {
    match kind {
        LightKind::OnOff => format!("{id}:set(0, 1)"),
        LightKind::Dimmable => {
            let fraction = encode_brightness(brightness.unwrap_or(u8::MAX));
            format!("{id}:set(0, {})", format_fraction(fraction))
        }
        LightKind::Rgb => {
            let fraction = encode_brightness(brightness.unwrap_or(u8::MAX));
            format!("{id}:execute(0, {})", format_fraction(fraction))
        }
    }
}

/// Write expression for turning a light off. Always the literal `0`;
/// only the verb differs by kind.
pub fn turn_off_expression(id: &GrentonId, kind: LightKind) -> String {
    match kind {
        LightKind::OnOff | LightKind::Dimmable => format!("{id}:set(0, 0)"),
        LightKind::Rgb => format!("{id}:execute(0, 0)"),
    }
}

/// On/off decode for a reply field. The field must be present and
/// non-zero to count as on; an absent field decodes as off rather than
/// letting a malformed reply masquerade as a valid state.
pub fn decode_state(value: Option<f64>) -> bool {
    matches!(value, Some(v) if v != 0.0)
}

/// Scale a 0–255 brightness level to the CLU's 0.0–1.0 fraction.
pub fn encode_brightness(level: u8) -> f64 {
    f64::from(level) / 255.0
}

/// Scale a CLU fraction back to a 0–255 brightness level.
pub fn decode_brightness(fraction: f64) -> u8 {
    (fraction * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Shortest round-trip decimal, keeping one decimal place for whole
/// values so full brightness stays `1.0` on the wire.
fn format_fraction(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}
