use std::{fmt, net::Ipv4Addr};

/// A multicast group joined on a specific local interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Membership {
    group: Ipv4Addr,
    interface: Ipv4Addr,
}

impl Membership {
    pub(super) fn new(group: Ipv4Addr, interface: Ipv4Addr) -> Membership {
        Membership { group, interface }
    }

    pub fn group(&self) -> Ipv4Addr {
        self.group
    }

    /// The local interface the group was joined on, `0.0.0.0` letting the OS choose.
    pub fn interface(&self) -> Ipv4Addr {
        self.interface
    }
}

impl fmt::Display for Membership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.group, self.interface)
    }
}
