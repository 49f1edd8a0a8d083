use std::rc::Rc;

use noc_router_core::config::{Link, NetworkConfig, NetworkConfigBuilder};
use noc_router_core::flit::{Flit, FlitKind, NetDest, RouteInfo, Time};
use noc_router_core::network::Network;
use noc_router_core::routing::RoutingAlgorithm;

/// A small 4-router ring, one vnet, 4 VCs per vnet, used by the routing and
/// switch-allocator test suites. Port 0 is "Local" (the network interface),
/// ports 1/2 are "Right"/"Left".
pub fn ring_network(num_routers: usize, vnet_ordered: &[bool]) -> Network
{
	let num_vnets = vnet_ordered.len();
	let mut builder = NetworkConfigBuilder::new(num_routers, 3, num_vnets, 4)
		.routing_algorithm(RoutingAlgorithm::Ring)
		.wormhole(true)
		.initial_credit(2);
	for (vnet, &ordered) in vnet_ordered.iter().enumerate()
	{
		builder = builder.vnet_ordered(vnet, ordered);
	}
	for r in 0..num_routers
	{
		let right = (r + 1) % num_routers;
		builder = builder.link(r, 1, right, 2);
	}
	let config: NetworkConfig = builder.finish();
	let mut network = Network::new(config, 42);
	for r in 0..num_routers
	{
		// Each port's name is shared between its input and output unit: it
		// names the neighbor direction the port faces, used symmetrically
		// by turn checks (on the input side) and route dispatch (on the
		// output side).
		network.router_mut(r).set_port_direction(0, "Local", "Local");
		network.router_mut(r).set_port_direction(1, "Right", "Right");
		network.router_mut(r).set_port_direction(2, "Left", "Left");
	}
	network
}

/// A small 4x4 mesh, one vnet, 4 VCs per vnet. Port layout per router:
/// 0 = Local, 1 = East/West pair partner via link, etc. (only the
/// directions actually exercised by a given test need to be linked).
pub fn mesh_network(num_rows: usize, num_cols: usize, vnet_ordered: &[bool]) -> Network
{
	let num_vnets = vnet_ordered.len();
	let num_routers = num_rows*num_cols;
	let mut builder = NetworkConfigBuilder::new(num_routers, 5, num_vnets, 4)
		.routing_algorithm(RoutingAlgorithm::Xy)
		.wormhole(true)
		.initial_credit(2)
		.mesh_dims(num_rows, num_cols);
	for (vnet, &ordered) in vnet_ordered.iter().enumerate()
	{
		builder = builder.vnet_ordered(vnet, ordered);
	}
	// ports: 0 Local, 1 East, 2 West, 3 North, 4 South
	let mut links = Vec::new();
	for row in 0..num_rows
	{
		for col in 0..num_cols
		{
			let id = row*num_cols + col;
			if col + 1 < num_cols
			{
				links.push(Link{ router_a: id, port_a: 1, router_b: id + 1, port_b: 2 });
			}
			if row + 1 < num_rows
			{
				links.push(Link{ router_a: id, port_a: 3, router_b: id + num_cols, port_b: 4 });
			}
		}
	}
	for l in links
	{
		builder = builder.link(l.router_a, l.port_a, l.router_b, l.port_b);
	}
	let config = builder.finish();
	let mut network = Network::new(config, 7);
	for id in 0..num_routers
	{
		network.router_mut(id).set_port_direction(0, "Local", "Local");
		network.router_mut(id).set_port_direction(1, "East", "East");
		network.router_mut(id).set_port_direction(2, "West", "West");
		network.router_mut(id).set_port_direction(3, "North", "North");
		network.router_mut(id).set_port_direction(4, "South", "South");
	}
	network
}

/// A 1D torus (ring with dateline-based adaptive routing) over `num_xs`
/// routers, one vnet, 4 VCs per vnet. Port layout: 0 = Local, 1 = Front
/// (+x), 2 = Back (-x), wired with wraparound so router 0's Back neighbor
/// is router `num_xs - 1`.
pub fn torus_network(num_xs: usize, vnet_ordered: &[bool]) -> Network
{
	let num_vnets = vnet_ordered.len();
	let mut builder = NetworkConfigBuilder::new(num_xs, 3, num_vnets, 4)
		.routing_algorithm(RoutingAlgorithm::Xyz)
		.wormhole(false)
		.initial_credit(2)
		.torus_dims(num_xs, 1, 1);
	for (vnet, &ordered) in vnet_ordered.iter().enumerate()
	{
		builder = builder.vnet_ordered(vnet, ordered);
	}
	for r in 0..num_xs
	{
		let next = (r + 1) % num_xs;
		builder = builder.link(r, 1, next, 2);
	}
	let config: NetworkConfig = builder.finish();
	let mut network = Network::new(config, 99);
	for r in 0..num_xs
	{
		network.router_mut(r).set_port_direction(0, "Local", "Local");
		network.router_mut(r).set_port_direction(1, "Front", "Front");
		network.router_mut(r).set_port_direction(2, "Back", "Back");
	}
	network
}

/// Build a single-flit (`HeadTail`) packet addressed to `dest_router`.
pub fn single_flit_packet(vnet: usize, num_nodes: usize, dest_router: usize, enqueue_time: Time) -> Flit
{
	let route = Rc::new(RouteInfo{
		vnet,
		net_dest: NetDest::singleton(num_nodes, dest_router),
		src_ni: 0,
		src_router: 0,
		dest_ni: dest_router,
		dest_router,
		hops_traversed: 0,
	});
	Flit::new(FlitKind::HeadTail, vnet, enqueue_time, route)
}

/// Build a `length`-flit wormhole packet addressed to `dest_router`
/// (head, then `length-2` body flits, then a tail).
pub fn wormhole_packet(vnet: usize, num_nodes: usize, dest_router: usize, enqueue_time: Time, length: usize) -> Vec<Flit>
{
	assert!(length >= 2);
	let route = Rc::new(RouteInfo{
		vnet,
		net_dest: NetDest::singleton(num_nodes, dest_router),
		src_ni: 0,
		src_router: 0,
		dest_ni: dest_router,
		dest_router,
		hops_traversed: 0,
	});
	let mut flits = Vec::with_capacity(length);
	flits.push(Flit::new(FlitKind::Head, vnet, enqueue_time, route.clone()));
	for _ in 0..length-2
	{
		flits.push(Flit::new(FlitKind::Body, vnet, enqueue_time, route.clone()));
	}
	flits.push(Flit::new(FlitKind::Tail, vnet, enqueue_time, route));
	flits
}
