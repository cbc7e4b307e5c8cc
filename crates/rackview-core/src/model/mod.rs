// ── Domain model ──

pub mod node;
pub mod refdata;

pub use node::{
    ChildDevice, ChildInterface, DomainRef, InterfaceLink, Node, NodeEvent, NodeKind, PowerState,
    ScriptResult, ServiceStatus, SystemId, ZoneRef,
};
pub use refdata::{
    Domain, KernelOption, OsCatalog, OsEntry, PowerField, PowerType, RefData, ReleaseEntry, Script,
    ScriptType, Tag, Zone,
};
