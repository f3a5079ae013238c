//! Host buffer map handed to [`DspEngine::process`](crate::DspEngine::process).

/// Borrowed host input and output channels for one `process` call.
///
/// Each slice is one channel holding at least the requested number of
/// frames. Channels beyond the engine's configured counts are ignored;
/// missing input channels read as silence.
pub struct ClientIo<'a, 'b> {
    inputs: &'a [&'b [f32]],
    outputs: &'a mut [&'b mut [f32]],
}

impl<'a, 'b> ClientIo<'a, 'b> {
    /// Wrap host channel slices.
    pub fn new(inputs: &'a [&'b [f32]], outputs: &'a mut [&'b mut [f32]]) -> Self {
        Self { inputs, outputs }
    }

    /// Number of input channels supplied.
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Number of output channels supplied.
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Input channel `ch`, if supplied.
    pub fn input(&self, ch: usize) -> Option<&[f32]> {
        self.inputs.get(ch).copied()
    }

    /// Output channel `ch`, if supplied.
    pub fn output_mut(&mut self, ch: usize) -> Option<&mut [f32]> {
        self.outputs.get_mut(ch).map(|s| &mut **s)
    }
}
