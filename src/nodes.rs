//! Boundary of the node manager that boots the machines behind an entity.
//!
//! Concrete managers (libvirt VMs, bare metal through a BMC, ...) live outside
//! this crate. Entities only need to order their calls.

use anyhow::Result;

/// Controller backing a node manager (hypervisor, BMC, ...).
pub trait NodeController: Send + Sync {
    /// Logs the controller's effective configuration. Observability only.
    fn log_configuration(&self);
}

/// Owns the set of compute nodes backing an entity.
///
/// Shared between entities through `Arc<dyn NodeManager>`; methods take
/// `&self` and implementations handle their own interior state.
pub trait NodeManager: Send + Sync {
    fn controller(&self) -> &dyn NodeController;

    /// Signals that the boot image is in place, unblocking node boot.
    fn notify_iso_ready(&self) -> Result<()>;

    /// Starts every node.
    ///
    /// With `check_ips` set, start waits until each node reports an IP address.
    fn start_all(&self, check_ips: bool) -> Result<()>;

    /// Number of nodes this manager owns.
    fn nodes_count(&self) -> usize;
}
