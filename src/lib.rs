/*!

noc-router-core
===============

The per-cycle routing and switch-allocation core of a virtual-channel
network-on-chip router: the routing unit that computes an outport (and, for
adaptive torus routing, a candidate set) for each packet head, and the
two-stage separable switch allocator that arbitrates input VCs onto output
ports under credit-based flow control.

# Scope

This crate implements exactly the routing unit and switch allocator: the
decision logic that runs once per clock cycle inside a single router. It
does not implement a full network-on-chip simulator — no traffic
generation, no statistics collection, no topology description language, no
event queue. The [`network`] and [`router`] modules exist only far enough
to give the routing/allocation core something real to operate against in
its own test suite; embedding this crate in a full simulator means
supplying your own link transport, traffic sources and measurement layer
around it.

# Usage

Add `noc-router-core` to your dependencies:

```toml
[dependencies]
noc-router-core = "0.1"
```

Build a [`config::NetworkConfig`] describing the ports, VCs and topology,
construct a [`network::Network`] from it, enqueue flits on specific input
VCs, and drive it one [`network::Network::clock_tick`] at a time.

*/

pub mod error;
pub mod flit;
pub mod direction;
pub mod vc;
pub mod routing;
pub mod allocator;
pub mod router;
pub mod network;
pub mod config;

pub use error::{AllocatorError, RoutingError};
pub use flit::{Flit, FlitKind, NetDest, PipelineStage, RouteInfo, Time};
pub use network::Network;
pub use router::Router;
