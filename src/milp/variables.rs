//! MILP variable handles.

/// Dense handle to a binary variable within a [`MilpModel`](super::MilpModel).
///
/// Handles are plain indices into the owning model's variable table and are
/// only meaningful for the model that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarId(pub(crate) usize);

impl VarId {
    /// Returns the dense index of this variable.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A binary (0/1) decision variable.
///
/// The modeling layer supports only binary variables; this is all the
/// precedence formulation needs, and it keeps the in-crate solver exact.
#[derive(Debug, Clone)]
pub struct BinVar {
    /// Variable name (unique identifier within a model).
    pub name: String,
}

impl BinVar {
    /// Creates a new binary variable.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
