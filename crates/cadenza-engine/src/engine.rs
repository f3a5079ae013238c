//! The chunked signal-graph engine.
//!
//! The host calls [`DspEngine::process`] with blocks of any size up to the
//! prepared host block. Input is queued in per-channel rings and the graph
//! runs whenever a full chunk is available, so output lags input by one
//! chunk. Each output ring starts with one chunk of silence to cover that
//! latency.

use std::time::Instant;

use cadenza_core::graph::{
    BuildContext, GraphBuilder, GraphDescription, NodeId, PrepareContext, ProcFactory,
    ProcessingGraph,
};
use cadenza_core::procs::HostPhasor;
use cadenza_core::{GraphError, OnePole, RingBuffer, Signal, TransportInfo, multiply_in_place};
use cadenza_registry::ProcRegistry;
use cadenza_synth::{Event, InputProtocol, InputToSignals, MAX_VOICES};

use crate::client_io::ClientIo;
use crate::published::PublishedSignals;
use crate::stats::EngineStats;

/// Path of the synthesized control adapter.
pub const CONTROL_INPUTS: &str = "control_inputs";
/// Path of the synthesized transport phasor.
pub const HOST_PHASOR: &str = "host_phasor";
/// Cutoff of the master volume smoother.
pub const MASTER_VOLUME_SLEW_HZ: f32 = 5.0;

const CONTROL_CLASS: &str = "midi_to_signals";
const PHASOR_CLASS: &str = "host_phasor";

/// Lifecycle position. Each stage requires the previous one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum EngineStage {
    /// Nothing built, or the last build failed.
    #[default]
    Empty,
    /// Graph built; needs compiling.
    Built,
    /// Schedule compiled; needs preparing.
    Compiled,
    /// Ready for `process`.
    Prepared,
}

/// Runs a compiled graph in fixed-size chunks under a host block.
pub struct DspEngine {
    graph: ProcessingGraph,
    factory: Box<dyn ProcFactory + Send>,
    stage: EngineStage,

    input_channels: usize,
    output_channels: usize,
    max_voices: usize,
    sample_rate: f32,
    host_block_size: usize,
    chunk_size: usize,

    control_inputs: Option<NodeId>,
    host_phasor: Option<NodeId>,
    published: PublishedSignals,

    input_rings: Vec<RingBuffer>,
    output_rings: Vec<RingBuffer>,
    chunk_in: Signal,
    samples_to_process: usize,

    master_volume: f32,
    volume: Signal,
    volume_filter: OnePole,

    protocol: InputProtocol,
    data_rate: f32,
    polyphony: usize,

    collect_stats: bool,
    stats: EngineStats,
    dropped_events: u64,
    underruns: u64,
}

impl Default for DspEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DspEngine {
    /// Create an engine with the built-in proc classes, no input channels
    /// and stereo output.
    pub fn new() -> Self {
        Self::with_factory(Box::new(ProcRegistry::new()))
    }

    /// Create an engine that instantiates procs through `factory`.
    ///
    /// The factory must know `midi_to_signals` and `host_phasor`.
    pub fn with_factory(factory: Box<dyn ProcFactory + Send>) -> Self {
        Self {
            graph: ProcessingGraph::new(0, 2),
            factory,
            stage: EngineStage::Empty,
            input_channels: 0,
            output_channels: 2,
            max_voices: MAX_VOICES,
            sample_rate: 48000.0,
            host_block_size: 0,
            chunk_size: 0,
            control_inputs: None,
            host_phasor: None,
            published: PublishedSignals::default(),
            input_rings: Vec::new(),
            output_rings: Vec::new(),
            chunk_in: Signal::default(),
            samples_to_process: 0,
            master_volume: 1.0,
            volume: Signal::default(),
            volume_filter: OnePole::new(48000.0, MASTER_VOLUME_SLEW_HZ),
            protocol: InputProtocol::Midi,
            data_rate: 100.0,
            polyphony: MAX_VOICES,
            collect_stats: false,
            stats: EngineStats::default(),
            dropped_events: 0,
            underruns: 0,
        }
    }

    // --- Lifecycle ---

    /// Replace the graph with one built from `desc`.
    ///
    /// With `wants_control_input` a `midi_to_signals` adapter is added at
    /// [`CONTROL_INPUTS`]; a transport phasor is always added at
    /// [`HOST_PHASOR`]. Both exist before the user's nodes, so the
    /// description can connect from them. Without `wants_audio_input`,
    /// connections from the host inputs are rejected.
    ///
    /// # Errors
    ///
    /// - [`GraphError::MissingClass`] for an unknown proc class
    /// - [`GraphError::MissingTarget`] for an unresolved connection or
    ///   published signal
    /// - [`GraphError::InvalidAttribute`] for malformed elements
    pub fn build(
        &mut self,
        desc: &GraphDescription,
        wants_audio_input: bool,
        wants_control_input: bool,
    ) -> Result<(), GraphError> {
        self.stage = EngineStage::Empty;
        self.graph.clear();
        self.graph.set_input_channels(self.input_channels);
        self.graph.set_output_channels(self.output_channels);
        self.published = PublishedSignals::default();
        self.control_inputs = None;
        self.host_phasor = None;

        let ctx = BuildContext {
            sample_rate: self.sample_rate,
            max_voices: self.max_voices,
        };
        if wants_control_input {
            let proc = self
                .factory
                .create(CONTROL_CLASS, &ctx)
                .ok_or_else(|| GraphError::MissingClass(CONTROL_CLASS.to_owned()))?;
            self.control_inputs = Some(self.graph.add_proc(CONTROL_INPUTS, proc)?);
        }
        let phasor = self
            .factory
            .create(PHASOR_CLASS, &ctx)
            .ok_or_else(|| GraphError::MissingClass(PHASOR_CLASS.to_owned()))?;
        self.host_phasor = Some(self.graph.add_proc(HOST_PHASOR, phasor)?);

        let decls = GraphBuilder::new(&*self.factory, ctx)
            .host_inputs(wants_audio_input)
            .build(desc, &mut self.graph)?;
        self.published = PublishedSignals::resolve(&decls, &self.graph)?;
        self.apply_control_settings();

        self.stage = EngineStage::Built;
        tracing::debug!(
            "engine_build: {} nodes, {} published, audio input {}, control input {}",
            self.graph.node_count(),
            decls.len(),
            wants_audio_input,
            wants_control_input
        );
        Ok(())
    }

    /// Compile the built graph into a schedule.
    ///
    /// # Errors
    ///
    /// - [`GraphError::NotReady`] if no build has succeeded
    /// - [`GraphError::Cycle`] if the connections form a cycle
    pub fn compile(&mut self) -> Result<(), GraphError> {
        if self.stage < EngineStage::Built {
            return Err(GraphError::NotReady("compile"));
        }
        self.stage = EngineStage::Built;
        self.graph.compile()?;
        self.stage = EngineStage::Compiled;
        Ok(())
    }

    /// Size every buffer for `host_block_size` frames per call and
    /// `chunk_size` frames per graph vector.
    ///
    /// # Errors
    ///
    /// - [`GraphError::NotReady`] if the graph has not compiled
    /// - [`GraphError::InvalidAttribute`] for a zero block or chunk size
    /// - [`GraphError::Allocation`] if a buffer cannot be sized
    pub fn prepare(
        &mut self,
        sample_rate: f32,
        host_block_size: usize,
        chunk_size: usize,
    ) -> Result<(), GraphError> {
        if self.stage < EngineStage::Compiled {
            return Err(GraphError::NotReady("prepare"));
        }
        self.stage = EngineStage::Compiled;
        if host_block_size == 0 || chunk_size == 0 {
            return Err(GraphError::invalid_attribute(
                "engine",
                "block_size",
                format!("block {host_block_size} and chunk {chunk_size} must be positive"),
            ));
        }

        // up to chunk - 1 frames stay queued between calls
        self.input_rings = rings(self.input_channels, host_block_size + chunk_size)?;
        self.output_rings = rings(self.output_channels, host_block_size + chunk_size)?;
        for ring in &mut self.output_rings {
            ring.write_silence(chunk_size);
        }
        self.chunk_in.resize(self.input_channels, chunk_size)?;
        self.volume.resize(1, chunk_size)?;
        self.volume_filter = OnePole::new(sample_rate, MASTER_VOLUME_SLEW_HZ);

        self.graph.prepare(&PrepareContext {
            sample_rate,
            vector_size: chunk_size,
            host_block_size,
        })?;
        self.graph.reset();
        self.published.prepare()?;

        self.sample_rate = sample_rate;
        self.host_block_size = host_block_size;
        self.chunk_size = chunk_size;
        self.samples_to_process = 0;
        self.stats = EngineStats::new(sample_rate);
        self.apply_control_settings();
        self.stage = EngineStage::Prepared;
        tracing::debug!(
            "engine_prepare: sr {sample_rate}, block {host_block_size}, chunk {chunk_size}, \
             {} in, {} out",
            self.input_channels,
            self.output_channels
        );
        Ok(())
    }

    // --- Processing ---

    /// Process one host block of `frames` frames.
    ///
    /// `events` carry times in frames from the start of this block. An event
    /// is delivered with the chunk that covers its time; events past the
    /// last whole chunk run in this call are not delivered. Output channels
    /// receive `frames` frames once enough have been rendered; until then
    /// they are left untouched.
    pub fn process(
        &mut self,
        io: &mut ClientIo<'_, '_>,
        frames: usize,
        events: &[Event],
        transport: &TransportInfo,
    ) {
        if self.stage != EngineStage::Prepared {
            tracing::warn!("process called on an unprepared engine ({:?})", self.stage);
            return;
        }

        let mut accepted = frames;
        for (ch, ring) in self.input_rings.iter_mut().enumerate() {
            let written = match io.input(ch) {
                Some(src) => {
                    let n = frames.min(src.len());
                    ring.write(&src[..n]) + ring.write_silence(frames - n)
                }
                None => ring.write_silence(frames),
            };
            if written < frames {
                tracing::warn!(
                    "input overrun on channel {ch}: {} frames dropped",
                    frames - written
                );
            }
            accepted = accepted.min(written);
        }
        self.samples_to_process += accepted;

        let chunk = self.chunk_size;
        let mut processed = 0;
        while self.samples_to_process >= chunk {
            for (ch, ring) in self.input_rings.iter_mut().enumerate() {
                let row = self.chunk_in.row_mut(ch);
                let read = ring.read(row);
                row[read..].fill(0.0);
            }

            if let Some(phasor) = self
                .host_phasor
                .and_then(|id| self.graph.proc_as::<HostPhasor>(id))
            {
                phasor.set_transport(transport.advanced_by(processed, self.sample_rate));
            }

            if let Some(adapter) = self
                .control_inputs
                .and_then(|id| self.graph.proc_as::<InputToSignals>(id))
            {
                let window = processed..processed + chunk;
                for event in events.iter().filter(|e| window.contains(&e.time)) {
                    if adapter.push_event(event.at(event.time - processed)).is_err() {
                        self.dropped_events += 1;
                    }
                }
            }

            let volume = self.volume.row_mut(0);
            volume.fill(self.master_volume);
            self.volume_filter.process_in_place(volume);

            let started = self.collect_stats.then(Instant::now);
            self.graph.process_chunk(&self.chunk_in);
            if let Some(started) = started {
                self.stats.record(chunk, started.elapsed());
            }

            for (ch, ring) in self.output_rings.iter_mut().enumerate() {
                let out = self.graph.host_output_mut(ch);
                multiply_in_place(out, self.volume.row(0));
                let written = ring.write(out);
                if written < chunk {
                    tracing::warn!(
                        "output overrun on channel {ch}: {} frames dropped",
                        chunk - written
                    );
                }
            }
            self.published.feed(&self.graph);

            processed += chunk;
            self.samples_to_process -= chunk;
        }

        if let Some(short) = self.output_rings.iter().map(|r| r.remaining()).min()
            && short < frames
        {
            self.underruns += 1;
            tracing::warn!("output underrun: {short} of {frames} frames available");
            return;
        }
        for (ch, ring) in self.output_rings.iter_mut().enumerate() {
            match io.output_mut(ch) {
                Some(dst) => {
                    let n = frames.min(dst.len());
                    ring.read(&mut dst[..n]);
                    ring.discard(frames - n);
                }
                None => {
                    ring.discard(frames);
                }
            }
        }
    }

    // --- Control surface ---

    /// Set the number of host input channels. Takes effect at the next
    /// build, or at the next compile if already built.
    pub fn set_input_channels(&mut self, channels: usize) {
        self.input_channels = channels;
        self.graph.set_input_channels(channels);
        self.stage = self.stage.min(EngineStage::Built);
    }

    /// Set the number of host output channels. Takes effect like
    /// [`set_input_channels`](Self::set_input_channels).
    pub fn set_output_channels(&mut self, channels: usize) {
        self.output_channels = channels;
        self.graph.set_output_channels(channels);
        self.stage = self.stage.min(EngineStage::Built);
    }

    /// Set the number of voices the control adapter exposes. Takes effect
    /// at the next build.
    pub fn set_max_voices(&mut self, voices: usize) {
        self.max_voices = voices.clamp(1, MAX_VOICES);
    }

    /// Set the master volume target; the applied gain glides toward it.
    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = if volume.is_finite() {
            volume.max(0.0)
        } else {
            0.0
        };
    }

    /// Turn per-chunk timing on or off.
    pub fn set_collect_stats(&mut self, collect: bool) {
        if collect && !self.collect_stats {
            self.stats.clear();
        }
        self.collect_stats = collect;
    }

    /// Select the control input protocol.
    pub fn set_engine_input_protocol(&mut self, protocol: InputProtocol) {
        self.protocol = protocol;
        self.apply_control_settings();
    }

    /// Set the rate in Hz at which control frames arrive. Passed to the
    /// control adapter for the transport layer that feeds it events.
    pub fn set_input_data_rate(&mut self, rate: f32) {
        self.data_rate = rate;
        self.apply_control_settings();
    }

    /// Set the number of voices allocated for notes. Returns the value in
    /// effect, which is limited to the exposed voices once built.
    pub fn set_polyphony(&mut self, voices: usize) -> usize {
        self.polyphony = voices.clamp(1, self.max_voices);
        self.apply_control_settings();
        self.polyphony
    }

    /// Enable or bypass the node at `path`. Returns false if no node has
    /// that path.
    pub fn set_node_enabled(&mut self, path: &str, enabled: bool) -> bool {
        match self.graph.node_by_path(path) {
            Some(id) => self.graph.set_enabled(id, enabled),
            None => {
                tracing::debug!("set_node_enabled: no node '{path}'");
                false
            }
        }
    }

    /// Set parameter `name` on the node at `path`. Returns false if the
    /// node or parameter does not exist.
    pub fn set_param(&mut self, path: &str, name: &str, value: f32) -> bool {
        match self.graph.node_by_path(path) {
            Some(id) => self.graph.set_param(id, name, value),
            None => {
                tracing::debug!("set_param: no node '{path}'");
                false
            }
        }
    }

    fn apply_control_settings(&mut self) {
        let Some(adapter) = self
            .control_inputs
            .and_then(|id| self.graph.proc_as::<InputToSignals>(id))
        else {
            return;
        };
        self.polyphony = adapter.set_polyphony(self.polyphony);
        adapter.set_protocol(self.protocol);
        adapter.set_data_rate(self.data_rate);
    }

    // --- Published signals ---

    /// Number of buffers published under `alias`.
    pub fn published_signal_voices(&self, alias: &str) -> usize {
        self.published.voices(alias)
    }

    /// Number of buffers under `alias` whose node is enabled.
    pub fn published_signal_voices_enabled(&self, alias: &str) -> usize {
        self.published.voices_enabled(alias, &self.graph)
    }

    /// Ring length of `alias` in samples.
    pub fn published_signal_buffer_size(&self, alias: &str) -> usize {
        self.published.buffer_size(alias)
    }

    /// Read `alias` into `out`, one row per enabled buffer. Returns the
    /// smallest count read, 0 if nothing contributed.
    pub fn read_published_signal(&mut self, alias: &str, out: &mut Signal) -> usize {
        self.published.read(alias, out, &self.graph)
    }

    /// Every published alias.
    pub fn published_signal_names(&self) -> Vec<&str> {
        self.published.names()
    }

    // --- Accessors ---

    /// Lifecycle position.
    pub fn stage(&self) -> EngineStage {
        self.stage
    }

    /// True once `prepare` has succeeded.
    pub fn is_prepared(&self) -> bool {
        self.stage == EngineStage::Prepared
    }

    /// The underlying graph.
    pub fn graph(&self) -> &ProcessingGraph {
        &self.graph
    }

    /// Published signal table.
    pub fn published(&self) -> &PublishedSignals {
        &self.published
    }

    /// Sample rate of the last successful prepare.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Host block size of the last successful prepare.
    pub fn host_block_size(&self) -> usize {
        self.host_block_size
    }

    /// Chunk size of the last successful prepare; also the latency in frames.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Host input channel count.
    pub fn input_channels(&self) -> usize {
        self.input_channels
    }

    /// Host output channel count.
    pub fn output_channels(&self) -> usize {
        self.output_channels
    }

    /// Master volume target.
    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    /// Polyphony requested for the control adapter.
    pub fn polyphony(&self) -> usize {
        self.polyphony
    }

    /// Selected control input protocol.
    pub fn input_protocol(&self) -> InputProtocol {
        self.protocol
    }

    /// Timing statistics.
    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Events rejected because the control queue was full.
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events
    }

    /// Calls that could not fill the host outputs.
    pub fn underruns(&self) -> u64 {
        self.underruns
    }
}

fn rings(count: usize, capacity: usize) -> Result<Vec<RingBuffer>, GraphError> {
    let mut out = Vec::new();
    out.try_reserve_exact(count)
        .map_err(|_| GraphError::Allocation(count))?;
    for _ in 0..count {
        let mut ring = RingBuffer::default();
        ring.resize(capacity)?;
        out.push(ring);
    }
    Ok(out)
}
