//! Published signals: named taps on node outputs for observers.
//!
//! A top-level `signal` declaration names a source proc path (with `*`
//! wildcards), an output port and an alias. Every matching node gets its own
//! ring buffer; the engine feeds each ring one chunk at a time and observers
//! read them back between `process` calls.

use cadenza_core::graph::{NodeId, ProcessingGraph, SignalDecl, TriggerMode};
use cadenza_core::{GraphError, RingBuffer, Signal};

/// One node output feeding one ring.
#[derive(Debug, Clone)]
pub struct PublishedBuffer {
    node: NodeId,
    port: usize,
    path: String,
    ring: RingBuffer,
}

impl PublishedBuffer {
    /// Path of the source node.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Samples waiting to be read.
    pub fn available(&self) -> usize {
        self.ring.remaining()
    }
}

/// All buffers published under one alias.
#[derive(Debug, Clone)]
pub struct PublishedSignal {
    alias: String,
    mode: TriggerMode,
    length: usize,
    frame_size: usize,
    buffers: Vec<PublishedBuffer>,
}

impl PublishedSignal {
    /// Name observers read this signal by.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Overflow behavior.
    pub fn mode(&self) -> TriggerMode {
        self.mode
    }

    /// Declared ring length in samples.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Samples per frame; reads move whole frames.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// One buffer per matching node, in graph order.
    pub fn buffers(&self) -> &[PublishedBuffer] {
        &self.buffers
    }
}

/// Alias table built from `signal` declarations.
#[derive(Debug, Clone, Default)]
pub struct PublishedSignals {
    signals: Vec<PublishedSignal>,
}

impl PublishedSignals {
    /// Resolve declarations against a built graph.
    ///
    /// Rings are left empty until [`prepare`](Self::prepare).
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::MissingTarget`] if no node matches a source
    /// path, a matching node lacks the output port, or an alias is declared
    /// twice.
    pub fn resolve(decls: &[SignalDecl], graph: &ProcessingGraph) -> Result<Self, GraphError> {
        let mut signals: Vec<PublishedSignal> = Vec::with_capacity(decls.len());
        for decl in decls {
            if signals.iter().any(|s| s.alias == decl.alias) {
                return Err(GraphError::missing_target(format!(
                    "published signal '{}' declared twice",
                    decl.alias
                )));
            }
            let nodes = graph.nodes_matching(&decl.proc);
            if nodes.is_empty() {
                return Err(GraphError::missing_target(format!(
                    "no proc matches '{}' for published signal '{}'",
                    decl.proc, decl.alias
                )));
            }
            let mut buffers = Vec::with_capacity(nodes.len());
            for node in nodes {
                let port = graph.output_port(node, &decl.output).ok_or_else(|| {
                    GraphError::missing_target(format!(
                        "output '{}' for published signal '{}'",
                        decl.output, decl.alias
                    ))
                })?;
                let path = graph
                    .node(node)
                    .map(|v| v.path.to_owned())
                    .unwrap_or_default();
                buffers.push(PublishedBuffer {
                    node,
                    port,
                    path,
                    ring: RingBuffer::default(),
                });
            }
            tracing::debug!(
                "published '{}' from {} node(s) matching '{}'",
                decl.alias,
                buffers.len(),
                decl.proc
            );
            signals.push(PublishedSignal {
                alias: decl.alias.clone(),
                mode: decl.mode,
                length: decl.length,
                frame_size: decl.frame_size,
                buffers,
            });
        }
        Ok(Self { signals })
    }

    /// Allocate every ring at its declared length.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Allocation`] if a ring cannot be sized.
    pub fn prepare(&mut self) -> Result<(), GraphError> {
        for signal in &mut self.signals {
            for buffer in &mut signal.buffers {
                buffer.ring.resize(signal.length)?;
            }
        }
        Ok(())
    }

    /// Drop everything buffered.
    pub fn clear(&mut self) {
        for signal in &mut self.signals {
            for buffer in &mut signal.buffers {
                buffer.ring.clear();
            }
        }
    }

    /// Copy the latest chunk of every source into its ring.
    pub fn feed(&mut self, graph: &ProcessingGraph) {
        for signal in &mut self.signals {
            for buffer in &mut signal.buffers {
                let Some(chunk) = graph.node_output(buffer.node, buffer.port) else {
                    continue;
                };
                if signal.mode == TriggerMode::MostRecent {
                    let space = buffer.ring.space();
                    if chunk.len() > space {
                        buffer.ring.discard(chunk.len() - space);
                    }
                    // a chunk longer than the ring keeps only its tail
                    let start = chunk.len().saturating_sub(buffer.ring.capacity());
                    buffer.ring.write(&chunk[start..]);
                } else {
                    buffer.ring.write(chunk);
                }
            }
        }
    }

    /// Look up an alias.
    pub fn get(&self, alias: &str) -> Option<&PublishedSignal> {
        self.signals.iter().find(|s| s.alias == alias)
    }

    /// Every alias in declaration order.
    pub fn names(&self) -> Vec<&str> {
        self.signals.iter().map(|s| s.alias.as_str()).collect()
    }

    /// Number of buffers behind `alias`, 0 if unknown.
    pub fn voices(&self, alias: &str) -> usize {
        self.get(alias).map_or(0, |s| s.buffers.len())
    }

    /// Number of buffers behind `alias` whose node is enabled.
    pub fn voices_enabled(&self, alias: &str, graph: &ProcessingGraph) -> usize {
        self.get(alias).map_or(0, |s| {
            s.buffers
                .iter()
                .filter(|b| graph.is_enabled(b.node))
                .count()
        })
    }

    /// Declared ring length of `alias`, 0 if unknown.
    pub fn buffer_size(&self, alias: &str) -> usize {
        self.get(alias).map_or(0, |s| s.length)
    }

    /// Read every enabled buffer of `alias` into consecutive rows of `out`.
    ///
    /// Each row receives at most `out.frames()` samples, rounded down to
    /// whole frames. In most-recent mode older samples beyond that are
    /// discarded so the newest window is read. Returns the smallest count
    /// read from any buffer, or 0 if the alias is unknown or no buffer
    /// contributed. `out` is zeroed first, so rows and frames that receive
    /// nothing read as silence.
    pub fn read(&mut self, alias: &str, out: &mut Signal, graph: &ProcessingGraph) -> usize {
        out.clear();
        let Some(signal) = self.signals.iter_mut().find(|s| s.alias == alias) else {
            tracing::debug!("read_published_signal: '{alias}' not found");
            return 0;
        };
        let frame = signal.frame_size.max(1);
        let want = out.frames() / frame * frame;
        let mut min_read: Option<usize> = None;
        let mut row = 0;
        for buffer in &mut signal.buffers {
            if row >= out.rows() {
                break;
            }
            if !graph.is_enabled(buffer.node) {
                continue;
            }
            let available = buffer.ring.remaining() / frame * frame;
            if signal.mode == TriggerMode::MostRecent && available > want {
                buffer.ring.discard(available - want);
            }
            let n = available.min(want);
            let read = buffer.ring.read(&mut out.row_mut(row)[..n]);
            min_read = Some(min_read.map_or(read, |m| m.min(read)));
            row += 1;
        }
        min_read.unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadenza_core::graph::{
        DescNode, PrepareContext, Proc, ProcessingGraph, SignalDecl, port_names,
    };
    use std::any::Any;

    /// Emits a running sample counter.
    struct Counter(f32);

    impl Proc for Counter {
        fn class_name(&self) -> &'static str {
            "counter"
        }
        fn inputs(&self) -> Vec<String> {
            Vec::new()
        }
        fn outputs(&self) -> Vec<String> {
            port_names(&["out"])
        }
        fn process(&mut self, _inputs: &Signal, outputs: &mut Signal) {
            for s in outputs.row_mut(0) {
                *s = self.0;
                self.0 += 1.0;
            }
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn graph() -> ProcessingGraph {
        let mut g = ProcessingGraph::new(0, 1);
        g.add_proc("v/1/c", Box::new(Counter(0.0))).unwrap();
        g.add_proc("v/2/c", Box::new(Counter(100.0))).unwrap();
        g.compile().unwrap();
        g.prepare(&PrepareContext {
            sample_rate: 48000.0,
            vector_size: 4,
            host_block_size: 4,
        })
        .unwrap();
        g
    }

    fn decl(mode: &str, length: i64) -> SignalDecl {
        SignalDecl::from_desc(
            &DescNode::signal("v/*/c", "out", "taps")
                .attr("mode", mode)
                .attr("length", length),
        )
        .unwrap()
    }

    fn run(g: &mut ProcessingGraph, p: &mut PublishedSignals, chunks: usize) {
        for _ in 0..chunks {
            g.process_chunk(&Signal::default());
            p.feed(g);
        }
    }

    #[test]
    fn wildcard_matches_every_copy() {
        let g = graph();
        let p = PublishedSignals::resolve(&[decl("most_recent", 8)], &g).unwrap();
        assert_eq!(p.voices("taps"), 2);
        assert_eq!(p.buffer_size("taps"), 8);
        assert_eq!(p.names(), ["taps"]);
        assert_eq!(p.get("taps").unwrap().buffers()[1].path(), "v/2/c");
        assert_eq!(p.voices("nothing"), 0);
    }

    #[test]
    fn unresolved_sources_are_missing_targets() {
        let g = graph();
        let bad_proc = SignalDecl::from_desc(&DescNode::signal("w/*", "out", "x")).unwrap();
        assert!(matches!(
            PublishedSignals::resolve(&[bad_proc], &g),
            Err(GraphError::MissingTarget(_))
        ));
        let bad_port = SignalDecl::from_desc(&DescNode::signal("v/*/c", "left", "x")).unwrap();
        assert!(matches!(
            PublishedSignals::resolve(&[bad_port], &g),
            Err(GraphError::MissingTarget(_))
        ));
    }

    #[test]
    fn most_recent_reads_newest_window() {
        let mut g = graph();
        let mut p = PublishedSignals::resolve(&[decl("most_recent", 8)], &g).unwrap();
        p.prepare().unwrap();
        run(&mut g, &mut p, 5);

        let mut out = Signal::new(2, 4);
        assert_eq!(p.read("taps", &mut out, &g), 4);
        assert_eq!(out.row(0), &[16.0, 17.0, 18.0, 19.0]);
        assert_eq!(out.row(1), &[116.0, 117.0, 118.0, 119.0]);
    }

    #[test]
    fn no_trash_keeps_oldest_and_drops_overflow() {
        let mut g = graph();
        let mut p = PublishedSignals::resolve(&[decl("no_trash", 8)], &g).unwrap();
        p.prepare().unwrap();
        run(&mut g, &mut p, 5);

        let mut out = Signal::new(1, 4);
        assert_eq!(p.read("taps", &mut out, &g), 4);
        assert_eq!(out.row(0), &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(p.read("taps", &mut out, &g), 4);
        assert_eq!(out.row(0), &[4.0, 5.0, 6.0, 7.0]);
        assert_eq!(p.read("taps", &mut out, &g), 0);
    }

    #[test]
    fn disabled_nodes_are_skipped() {
        let mut g = graph();
        let mut p = PublishedSignals::resolve(&[decl("most_recent", 8)], &g).unwrap();
        p.prepare().unwrap();
        run(&mut g, &mut p, 1);

        let first = g.node_by_path("v/1/c").unwrap();
        g.set_enabled(first, false);
        assert_eq!(p.voices_enabled("taps", &g), 1);

        let mut out = Signal::new(2, 4);
        assert_eq!(p.read("taps", &mut out, &g), 4);
        assert_eq!(out.row(0), &[100.0, 101.0, 102.0, 103.0]);
        assert_eq!(out.row(1), &[0.0; 4]);
    }

    #[test]
    fn stale_samples_do_not_survive_a_shorter_read() {
        let mut g = graph();
        let mut p = PublishedSignals::resolve(&[decl("no_trash", 8)], &g).unwrap();
        p.prepare().unwrap();
        run(&mut g, &mut p, 2);

        let mut out = Signal::new(2, 8);
        assert_eq!(p.read("taps", &mut out, &g), 8);
        assert_eq!(out.row(1)[7], 107.0);

        run(&mut g, &mut p, 1);
        let second = g.node_by_path("v/2/c").unwrap();
        g.set_enabled(second, false);
        assert_eq!(p.read("taps", &mut out, &g), 4);
        assert_eq!(out.row(0), &[8.0, 9.0, 10.0, 11.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(out.row(1), &[0.0; 8]);

        assert_eq!(p.read("taps", &mut out, &g), 0);
        assert!(out.as_slice().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn unknown_alias_reads_nothing() {
        let g = graph();
        let mut p = PublishedSignals::default();
        let mut out = Signal::new(1, 4);
        assert_eq!(p.read("taps", &mut out, &g), 0);
    }
}
