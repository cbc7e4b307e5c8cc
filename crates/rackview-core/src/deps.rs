// ── Explicit dependency graph ──
//
// Each section view-model declares which inputs it derives from. A
// reconciliation pass recomputes exactly the sections whose declared
// dependencies intersect the set of changed inputs, replacing implicit
// field watching with a testable dependency list.

/// One input the reconciliation pass can observe a change in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dep {
    /// The authoritative node was replaced or mutated.
    Node,
    Architectures,
    KernelOptions,
    OsCatalog,
    PowerTypes,
    Zones,
    Domains,
    Scripts,
    /// Controller service statuses changed out of band.
    Services,
}

impl Dep {
    const COUNT: u32 = 9;

    const fn mask(self) -> u16 {
        1 << self as u16
    }
}

/// A set of changed (or depended-upon) inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DepSet(u16);

impl DepSet {
    pub const EMPTY: Self = Self(0);

    pub const fn all() -> Self {
        Self((1 << Dep::COUNT) - 1)
    }

    pub const fn of(dep: Dep) -> Self {
        Self(dep.mask())
    }

    pub const fn with(self, dep: Dep) -> Self {
        Self(self.0 | dep.mask())
    }

    pub const fn contains(self, dep: Dep) -> bool {
        self.0 & dep.mask() != 0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, dep: Dep) {
        self.0 |= dep.mask();
    }
}

impl std::ops::BitOr for DepSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl From<Dep> for DepSet {
    fn from(dep: Dep) -> Self {
        Self::of(dep)
    }
}
