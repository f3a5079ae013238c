//! Engine settings file format.

use serde::{Deserialize, Serialize};
use std::path::Path;

use cadenza_synth::InputProtocol;

use crate::error::ConfigError;

/// Where the engine's control events come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolSetting {
    /// Plain MIDI.
    #[default]
    Midi,
    /// MIDI Polyphonic Expression.
    Mpe,
    /// OSC touch frames, decoded by the transport layer.
    Osc,
}

impl From<ProtocolSetting> for InputProtocol {
    fn from(p: ProtocolSetting) -> Self {
        match p {
            ProtocolSetting::Midi => InputProtocol::Midi,
            ProtocolSetting::Mpe => InputProtocol::MidiMpe,
            ProtocolSetting::Osc => InputProtocol::Osc,
        }
    }
}

/// Engine settings.
///
/// Every field has a default, so an empty table is a valid configuration.
///
/// # TOML Format
///
/// ```toml
/// sample_rate = 48000
/// block_size = 512
/// chunk_size = 64
/// input_channels = 0
/// output_channels = 2
/// polyphony = 8
/// master_volume = 0.8
/// collect_stats = false
/// protocol = "mpe"
/// audio_input = false
/// control_input = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Frames the host delivers per `process` call.
    pub block_size: usize,
    /// Frames per graph vector.
    pub chunk_size: usize,
    /// Host input channels.
    pub input_channels: usize,
    /// Host output channels.
    pub output_channels: usize,
    /// Voices available to the event converter.
    pub polyphony: usize,
    /// Linear master gain.
    pub master_volume: f32,
    /// Log per-chunk timing.
    pub collect_stats: bool,
    /// Control event protocol.
    pub protocol: ProtocolSetting,
    /// Route host inputs into the graph.
    pub audio_input: bool,
    /// Synthesize the event converter.
    pub control_input: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            block_size: 512,
            chunk_size: 64,
            input_channels: 0,
            output_channels: 2,
            polyphony: 16,
            master_volume: 1.0,
            collect_stats: false,
            protocol: ProtocolSetting::Midi,
            audio_input: false,
            control_input: true,
        }
    }
}

impl EngineConfig {
    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Parse and validate settings from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the settings to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the settings to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::invalid_value("sample_rate", "must be positive"));
        }
        if self.block_size == 0 {
            return Err(ConfigError::invalid_value("block_size", "must be positive"));
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::invalid_value("chunk_size", "must be positive"));
        }
        if self.polyphony == 0 {
            return Err(ConfigError::invalid_value("polyphony", "must be at least 1"));
        }
        if !self.master_volume.is_finite() || self.master_volume < 0.0 {
            return Err(ConfigError::invalid_value(
                "master_volume",
                format!("expected a non-negative gain, got {}", self.master_volume),
            ));
        }
        Ok(())
    }

    /// Sample rate as `f32`.
    pub fn sample_rate_hz(&self) -> f32 {
        self.sample_rate as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_is_default() {
        let config = EngineConfig::from_toml("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn partial_table_keeps_other_defaults() {
        let config = EngineConfig::from_toml("chunk_size = 32\nprotocol = \"mpe\"").unwrap();
        assert_eq!(config.chunk_size, 32);
        assert_eq!(config.block_size, 512);
        assert_eq!(InputProtocol::from(config.protocol), InputProtocol::MidiMpe);
    }

    #[test]
    fn rejects_zero_chunk() {
        let err = EngineConfig::from_toml("chunk_size = 0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "chunk_size"));
    }

    #[test]
    fn rejects_unknown_protocol() {
        assert!(matches!(
            EngineConfig::from_toml("protocol = \"sysex\""),
            Err(ConfigError::TomlParse(_))
        ));
    }

    #[test]
    fn toml_roundtrip() {
        let config = EngineConfig {
            polyphony: 4,
            master_volume: 0.5,
            ..EngineConfig::default()
        };
        let parsed = EngineConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }
}
