//! Shared CLI helpers used across multiple commands.

use anyhow::Context;
use cadenza_config::GraphFile;
use cadenza_engine::DspEngine;

/// A `path:name=value` parameter override.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamOverride {
    /// Node path.
    pub path: String,
    /// Parameter name.
    pub name: String,
    /// New value.
    pub value: f32,
}

/// Parse a `path:name=value` string for clap's `value_parser`.
pub fn parse_param(s: &str) -> Result<ParamOverride, String> {
    let invalid = || format!("Invalid parameter format: '{s}' (expected path:name=value)");
    let (target, value) = s.split_once('=').ok_or_else(invalid)?;
    let (path, name) = target.rsplit_once(':').ok_or_else(invalid)?;
    if path.is_empty() || name.is_empty() {
        return Err(invalid());
    }
    let value = value
        .trim()
        .parse::<f32>()
        .map_err(|_| format!("Invalid parameter value in '{s}'"))?;
    Ok(ParamOverride {
        path: path.to_owned(),
        name: name.to_owned(),
        value,
    })
}

/// Build and compile the engine described by a graph file.
pub fn build_engine(file: &GraphFile) -> anyhow::Result<DspEngine> {
    let cfg = &file.engine;
    let mut engine = DspEngine::new();
    engine.set_input_channels(cfg.input_channels);
    engine.set_output_channels(cfg.output_channels);
    engine.set_engine_input_protocol(cfg.protocol.into());
    engine.set_master_volume(cfg.master_volume);
    engine.set_collect_stats(cfg.collect_stats);
    engine.set_polyphony(cfg.polyphony);

    engine
        .build(&file.description, cfg.audio_input, cfg.control_input)
        .context("building graph")?;
    engine.compile().context("compiling graph")?;
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_paths() {
        let p = parse_param("voice/2/osc:gain=0.5").unwrap();
        assert_eq!(p.path, "voice/2/osc");
        assert_eq!(p.name, "gain");
        assert_eq!(p.value, 0.5);
    }

    #[test]
    fn rejects_malformed_overrides() {
        assert!(parse_param("osc=0.5").is_err());
        assert!(parse_param(":gain=1").is_err());
        assert!(parse_param("osc:gain=loud").is_err());
    }

    #[test]
    fn engine_follows_file_settings() {
        let file = GraphFile::from_toml(
            r#"
            [engine]
            output_channels = 1
            polyphony = 3

            [[proc]]
            class = "gain"
            name = "amp"
            "#,
        )
        .unwrap();
        let engine = build_engine(&file).unwrap();
        assert_eq!(engine.output_channels(), 1);
        assert_eq!(engine.polyphony(), 3);
        assert!(engine.graph().node_by_path("amp").is_some());
    }
}
