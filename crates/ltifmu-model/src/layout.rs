//! Register layout: the value references shared by the compiled source and
//! the interface descriptor.

use std::ops::Range;

/// One contiguous block of registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Block {
    /// Continuous states `x`.
    State,
    /// State derivatives `der(x)`.
    Derivative,
    /// State start values `x0`.
    StateStart,
    /// Inputs `u`.
    Input,
    /// Input start values `u0`.
    InputStart,
    /// Outputs `y`.
    Output,
}

impl Block {
    /// All blocks, in register order.
    pub const ORDER: [Block; 6] = [
        Block::State,
        Block::Derivative,
        Block::StateStart,
        Block::Input,
        Block::InputStart,
        Block::Output,
    ];

    /// Short name used in generated identifiers.
    pub fn short_name(self) -> &'static str {
        match self {
            Block::State => "x",
            Block::Derivative => "der",
            Block::StateStart => "x0",
            Block::Input => "u",
            Block::InputStart => "u0",
            Block::Output => "y",
        }
    }

    fn index(self) -> usize {
        match self {
            Block::State => 0,
            Block::Derivative => 1,
            Block::StateStart => 2,
            Block::Input => 3,
            Block::InputStart => 4,
            Block::Output => 5,
        }
    }
}

/// Register allocation for a model with `nx` states, `nu` inputs, `ny` outputs.
///
/// Blocks are laid out back to back in [`Block::ORDER`] with sizes
/// `[nx, nx, nx, nu, nu, ny]`, so they cover `0..nr` exactly once with
/// `nr = 3 nx + 2 nu + ny`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableLayout {
    nx: usize,
    nu: usize,
    ny: usize,
    bases: [usize; 6],
    nr: usize,
}

impl VariableLayout {
    /// Allocate registers for the given dimensions.
    pub fn allocate(nx: usize, nu: usize, ny: usize) -> Self {
        let sizes = [nx, nx, nx, nu, nu, ny];
        let mut bases = [0usize; 6];
        let mut offset = 0;
        for (base, size) in bases.iter_mut().zip(sizes) {
            *base = offset;
            offset += size;
        }
        Self {
            nx,
            nu,
            ny,
            bases,
            nr: offset,
        }
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn nu(&self) -> usize {
        self.nu
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    /// Total number of registers.
    pub fn register_count(&self) -> usize {
        self.nr
    }

    /// Number of registers in a block.
    pub fn size(&self, block: Block) -> usize {
        match block {
            Block::State | Block::Derivative | Block::StateStart => self.nx,
            Block::Input | Block::InputStart => self.nu,
            Block::Output => self.ny,
        }
    }

    /// First register of a block.
    pub fn base(&self, block: Block) -> usize {
        self.bases[block.index()]
    }

    /// Registers of a block, as a half-open range.
    pub fn range(&self, block: Block) -> Range<usize> {
        let base = self.base(block);
        base..base + self.size(block)
    }

    /// Register of the `i`th element of a block.
    ///
    /// Returns `None` when `i` is past the end of the block.
    pub fn value_reference(&self, block: Block, i: usize) -> Option<usize> {
        (i < self.size(block)).then(|| self.base(block) + i)
    }

    /// Block and element owning register `vr`.
    pub fn locate(&self, vr: usize) -> Option<(Block, usize)> {
        Block::ORDER
            .into_iter()
            .find(|&block| self.range(block).contains(&vr))
            .map(|block| (block, vr - self.base(block)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_are_contiguous_and_cover_all_registers() {
        for nx in 0..5 {
            for nu in 0..4 {
                for ny in 0..4 {
                    let layout = VariableLayout::allocate(nx, nu, ny);
                    assert_eq!(layout.register_count(), 3 * nx + 2 * nu + ny);

                    let mut next = 0;
                    for block in Block::ORDER {
                        let range = layout.range(block);
                        assert_eq!(range.start, next, "{block:?} for ({nx},{nu},{ny})");
                        next = range.end;
                    }
                    assert_eq!(next, layout.register_count());
                }
            }
        }
    }

    #[test]
    fn bases_follow_cumulative_sizes() {
        let layout = VariableLayout::allocate(2, 1, 3);
        assert_eq!(layout.base(Block::State), 0);
        assert_eq!(layout.base(Block::Derivative), 2);
        assert_eq!(layout.base(Block::StateStart), 4);
        assert_eq!(layout.base(Block::Input), 6);
        assert_eq!(layout.base(Block::InputStart), 7);
        assert_eq!(layout.base(Block::Output), 8);
        assert_eq!(layout.register_count(), 11);
    }

    #[test]
    fn locate_inverts_value_reference() {
        let layout = VariableLayout::allocate(3, 2, 1);
        for vr in 0..layout.register_count() {
            let (block, i) = layout.locate(vr).unwrap();
            assert_eq!(layout.value_reference(block, i), Some(vr));
        }
        assert_eq!(layout.locate(layout.register_count()), None);
    }

    #[test]
    fn empty_blocks() {
        let layout = VariableLayout::allocate(0, 0, 2);
        assert!(layout.range(Block::State).is_empty());
        assert!(layout.range(Block::Input).is_empty());
        assert_eq!(layout.range(Block::Output), 0..2);
        assert_eq!(layout.value_reference(Block::State, 0), None);

        let empty = VariableLayout::allocate(0, 0, 0);
        assert_eq!(empty.register_count(), 0);
        assert_eq!(empty.locate(0), None);
    }
}
