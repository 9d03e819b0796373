//! Label numbering for code generation
//!
//! Every family of generated labels has its own monotonic counter so that
//! nested constructs of the same kind never collide within one compilation
//! unit.

/// Label identifier for code generation
pub type LabelId = u32;

/// One counter per label family
#[derive(Debug, Clone, Default)]
pub struct LabelCounters {
    string_consts: LabelId,
    float_consts: LabelId,
    comparisons: LabelId,
    ifs: LabelId,
    loops: LabelId,
    and_ors: LabelId,
    static_guards: LabelId,
    object_cells: LabelId,
}

fn bump(counter: &mut LabelId) -> LabelId {
    *counter += 1;
    *counter
}

impl LabelCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// `.$$.str.N`
    pub fn next_string(&mut self) -> LabelId {
        bump(&mut self.string_consts)
    }

    /// `.$$.float.N`
    pub fn next_float(&mut self) -> LabelId {
        bump(&mut self.float_consts)
    }

    /// `.$$.cmp.N`
    pub fn next_comparison(&mut self) -> LabelId {
        bump(&mut self.comparisons)
    }

    /// `.$$.else.N` / `.$$.endif.N`
    pub fn next_if(&mut self) -> LabelId {
        bump(&mut self.ifs)
    }

    /// `.$$.loopCheck.N` / `.$$.loopEnd.N`
    pub fn next_loop(&mut self) -> LabelId {
        bump(&mut self.loops)
    }

    /// `.$$.andorSkip.N` / `.$$.andorEnd.N`
    pub fn next_and_or(&mut self) -> LabelId {
        bump(&mut self.and_ors)
    }

    /// `.$$.static.N`
    pub fn next_static_guard(&mut self) -> LabelId {
        bump(&mut self.static_guards)
    }

    /// `.$$.dtor.N`
    pub fn next_object_cell(&mut self) -> LabelId {
        bump(&mut self.object_cells)
    }
}
