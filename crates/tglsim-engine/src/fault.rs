//! Fault models: which nodes actually forward what they receive.
//!
//! Both protocols consult the same [`FaultModel`] before letting an active
//! node send, so adversarial behaviour is a strategy rather than a separate
//! engine.

use tglsim_topology::Node;

/// Decides whether a node that holds the message forwards it.
pub trait FaultModel {
    fn forwards(&self, node: &Node) -> bool;
}

/// Malicious nodes silently drop everything. The default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropMalicious;

impl FaultModel for DropMalicious {
    fn forwards(&self, node: &Node) -> bool {
        !node.is_malicious
    }
}

/// Every node forwards, regardless of its malicious flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cooperative;

impl FaultModel for Cooperative {
    fn forwards(&self, _node: &Node) -> bool {
        true
    }
}

impl<F: FaultModel + ?Sized> FaultModel for &F {
    fn forwards(&self, node: &Node) -> bool {
        (**self).forwards(node)
    }
}
