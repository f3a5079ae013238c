//! Beat phasor driven by the host transport.

use core::any::Any;

use crate::graph::{PrepareContext, Proc, port_names};
use crate::{GraphError, Signal, TransportInfo};

/// Ramps from 0 to 1 once per beat while the host transport plays.
///
/// The engine hands it a [`TransportInfo`] aligned to the start of every
/// vector via [`set_transport`](Self::set_transport). While stopped the
/// output is zero.
#[derive(Debug, Clone, Default)]
pub struct HostPhasor {
    transport: TransportInfo,
    sample_rate: f32,
}

impl HostPhasor {
    /// Create a stopped phasor.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            transport: TransportInfo::default(),
            sample_rate,
        }
    }

    /// Set the transport position at the start of the next vector.
    pub fn set_transport(&mut self, transport: TransportInfo) {
        self.transport = transport;
    }

    /// The transport last handed in.
    pub fn transport(&self) -> &TransportInfo {
        &self.transport
    }
}

impl Proc for HostPhasor {
    fn class_name(&self) -> &'static str {
        "host_phasor"
    }

    fn inputs(&self) -> Vec<String> {
        Vec::new()
    }

    fn outputs(&self) -> Vec<String> {
        port_names(&["out"])
    }

    fn prepare(&mut self, ctx: &PrepareContext) -> Result<(), GraphError> {
        self.sample_rate = ctx.sample_rate;
        Ok(())
    }

    fn process(&mut self, _inputs: &Signal, outputs: &mut Signal) {
        let out = outputs.row_mut(0);
        if !self.transport.is_playing() {
            out.fill(0.0);
            return;
        }
        let step = self.transport.beats_per_sample(self.sample_rate);
        let mut phase = self.transport.beat_phase();
        for sample in out.iter_mut() {
            *sample = phase as f32;
            phase += step;
            if phase >= 1.0 {
                phase -= 1.0;
            }
        }
    }

    fn reset(&mut self) {
        self.transport = TransportInfo::default();
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TransportState;

    #[test]
    fn stopped_is_silent() {
        let mut p = HostPhasor::new(48000.0);
        let mut out = Signal::new(1, 4);
        out.row_mut(0).fill(9.0);
        p.process(&Signal::default(), &mut out);
        assert_eq!(out.row(0), &[0.0; 4]);
    }

    #[test]
    fn ramps_and_wraps_once_per_beat() {
        // 60 BPM at 8 Hz sample rate: eight samples per beat
        let mut p = HostPhasor::new(8.0);
        p.set_transport(TransportInfo::new(0.0, 2.5, 60.0, TransportState::Playing));
        let mut out = Signal::new(1, 6);
        p.process(&Signal::default(), &mut out);
        assert_eq!(out.row(0), &[0.5, 0.625, 0.75, 0.875, 0.0, 0.125]);
    }
}
