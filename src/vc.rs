/*!

Input and output virtual-channel state, and the input/output units that
own them. The routing unit and switch allocator only ever reach VC state
through this narrow method set, never by touching the fields directly.

*/

use std::collections::VecDeque;

use crate::direction::DirectionMap;
use crate::flit::{Flit, PipelineStage, Time};
use crate::routing::OutportHalf;

/// State of a virtual channel.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum VcState
{
	Idle,
	/// Allocated for a head flit whose output VC has not yet been bound.
	AllocatedForHead,
	Active,
}

/// An incoming credit, destined for an upstream router's `OutputUnit`.
/// Emitted by `InputUnit::increment_credit`; delivering it across the
/// reverse physical link is the job of the surrounding simulator kernel
/// (link/credit transport between routers is out of scope here),
/// so this crate only records the event for a harness to drain and apply.
#[derive(Clone,Copy,Debug)]
pub struct CreditReturn
{
	pub vc: usize,
	pub vc_free: bool,
	pub tick: Time,
}

/// One input virtual channel: a FIFO of flits plus the bookkeeping the
/// switch allocator reads and writes every cycle.
#[derive(Debug)]
pub struct InputVc
{
	state: VcState,
	queue: VecDeque<Flit>,
	/// Earliest tick at which the head flit may be serviced; advances as
	/// flits are enqueued and as credits free up buffer space upstream of
	/// this VC. For the purposes of this crate's allocator, a VC is simply
	/// ready whenever it is non-empty and its head flit is tagged `Sa`.
	enqueue_time: Time,
	granted_outport: Option<usize>,
	granted_outvc: Option<usize>,
	granted_first_half: Option<bool>,
	/// The candidate `(outport, first_half)` set a torus head was offered;
	/// stored here by the upstream `outport_compute_xyz` call so that SA-I
	/// can read it back via `get_outports`.
	torus_candidates: Vec<OutportHalf>,
}

impl Default for InputVc
{
	fn default() -> InputVc
	{
		InputVc{
			state: VcState::Idle,
			queue: VecDeque::new(),
			enqueue_time: 0,
			granted_outport: None,
			granted_outvc: None,
			granted_first_half: None,
			torus_candidates: Vec::new(),
		}
	}
}

impl InputVc
{
	pub fn state(&self) -> VcState
	{
		self.state
	}

	/// Insert a flit at the tail of this VC's FIFO. `vnet` ownership of a
	/// VC (`vnet = vc_index / vcs_per_vnet`) is enforced by the caller; this
	/// type has no notion of its own index.
	pub fn push(&mut self, flit: Flit)
	{
		if self.queue.is_empty()
		{
			self.enqueue_time = flit.enqueue_time;
		}
		if flit.kind.is_head()
		{
			self.state = VcState::AllocatedForHead;
		}
		self.queue.push_back(flit);
	}

	/// `is_ready(vc, tick)`. True when the head flit exists;
	/// the `tick` parameter is accepted for signature fidelity with the
	/// external interface but this crate has no sub-cycle scheduling of its
	/// own VCs, so readiness reduces to non-emptiness.
	pub fn is_ready(&self, _tick: Time) -> bool
	{
		!self.queue.is_empty()
	}

	/// `need_stage(vc, SA, tick)`. True when the head flit is
	/// ready and tagged for `stage`.
	pub fn need_stage(&self, stage: PipelineStage, tick: Time) -> bool
	{
		self.is_ready(tick) && self.queue.front().map(|f| f.stage) == Some(stage)
	}

	/// `peek_top_flit`: read without removing.
	pub fn peek_top_flit(&self) -> &Flit
	{
		self.queue.front().expect("peek_top_flit on an empty VC")
	}

	/// `get_top_flit`: pop the head flit for switch traversal.
	pub fn pop_top_flit(&mut self) -> Flit
	{
		self.queue.pop_front().expect("get_top_flit on an empty VC")
	}

	pub fn get_enqueue_time(&self) -> Time
	{
		self.enqueue_time
	}

	pub fn get_outport(&self) -> Option<usize>
	{
		self.granted_outport
	}
	pub fn get_outvc(&self) -> Option<usize>
	{
		self.granted_outvc
	}
	pub fn get_firsthalf(&self) -> Option<bool>
	{
		self.granted_first_half
	}
	pub fn get_outports(&self) -> &[OutportHalf]
	{
		&self.torus_candidates
	}

	pub fn grant_outport(&mut self, outport: usize)
	{
		self.granted_outport = Some(outport);
	}
	pub fn grant_outvc(&mut self, outvc: usize)
	{
		self.granted_outvc = Some(outvc);
	}
	/// Unbind this VC's output VC, so SA-I re-evaluates it fresh this cycle.
	/// In wormhole mode every flit of a packet is re-checked against
	/// `has_vc_with_credits` rather than a single VC pinned at the head.
	pub fn clear_outvc(&mut self)
	{
		self.granted_outvc = None;
	}
	pub fn grant_firsthalf(&mut self, first_half: bool)
	{
		self.granted_first_half = Some(first_half);
	}
	pub fn set_torus_candidates(&mut self, candidates: Vec<OutportHalf>)
	{
		self.torus_candidates = candidates;
	}

	/// `set_vc_idle(vc, tick)`: free this VC's binding so it may be
	/// allocated to a new packet. Called just before `increment_credit`
	/// signals VC-free upstream.
	pub fn set_vc_idle(&mut self, _tick: Time)
	{
		self.state = VcState::Idle;
		self.granted_outport = None;
		self.granted_outvc = None;
		self.granted_first_half = None;
		self.torus_candidates.clear();
	}

	pub fn mark_active(&mut self)
	{
		self.state = VcState::Active;
	}
}

/// One input port: its direction name plus one `InputVc` per virtual
/// channel.
#[derive(Debug)]
pub struct InputUnit
{
	direction: String,
	vcs: Vec<InputVc>,
	pending_credits: Vec<CreditReturn>,
}

impl InputUnit
{
	pub fn new(direction: &str, num_vcs: usize) -> InputUnit
	{
		InputUnit{
			direction: direction.to_string(),
			vcs: (0..num_vcs).map(|_| InputVc::default()).collect(),
			pending_credits: Vec::new(),
		}
	}

	pub fn get_direction(&self) -> &str
	{
		&self.direction
	}
	pub fn set_direction(&mut self, direction: &str)
	{
		self.direction = direction.to_string();
	}

	pub fn vc(&self, vc: usize) -> &InputVc
	{
		&self.vcs[vc]
	}
	pub fn vc_mut(&mut self, vc: usize) -> &mut InputVc
	{
		&mut self.vcs[vc]
	}
	pub fn num_vcs(&self) -> usize
	{
		self.vcs.len()
	}

	pub fn need_stage(&self, vc: usize, stage: PipelineStage, tick: Time) -> bool
	{
		self.vcs[vc].need_stage(stage, tick)
	}
	pub fn is_ready(&self, vc: usize, tick: Time) -> bool
	{
		self.vcs[vc].is_ready(tick)
	}
	pub fn peek_top_flit(&self, vc: usize) -> &Flit
	{
		self.vcs[vc].peek_top_flit()
	}
	pub fn get_top_flit(&mut self, vc: usize) -> Flit
	{
		self.vcs[vc].pop_top_flit()
	}
	pub fn get_outport(&self, vc: usize) -> Option<usize>
	{
		self.vcs[vc].get_outport()
	}
	pub fn get_outvc(&self, vc: usize) -> Option<usize>
	{
		self.vcs[vc].get_outvc()
	}
	pub fn get_outports(&self, vc: usize) -> &[OutportHalf]
	{
		self.vcs[vc].get_outports()
	}
	pub fn set_torus_candidates(&mut self, vc: usize, candidates: Vec<OutportHalf>)
	{
		self.vcs[vc].set_torus_candidates(candidates);
	}
	pub fn get_firsthalf(&self, vc: usize) -> Option<bool>
	{
		self.vcs[vc].get_firsthalf()
	}
	pub fn get_enqueue_time(&self, vc: usize) -> Time
	{
		self.vcs[vc].get_enqueue_time()
	}
	pub fn grant_outport(&mut self, vc: usize, outport: usize)
	{
		self.vcs[vc].grant_outport(outport);
	}
	pub fn grant_outvc(&mut self, vc: usize, outvc: usize)
	{
		self.vcs[vc].grant_outvc(outvc);
	}
	pub fn clear_outvc(&mut self, vc: usize)
	{
		self.vcs[vc].clear_outvc();
	}
	pub fn grant_firsthalf(&mut self, vc: usize, first_half: bool)
	{
		self.vcs[vc].grant_firsthalf(first_half);
	}
	pub fn set_vc_idle(&mut self, vc: usize, tick: Time)
	{
		self.vcs[vc].set_vc_idle(tick);
	}

	/// `increment_credit(vc, vc_free, tick)`: send a credit back upstream,
	/// optionally announcing that this VC is now idle. Recorded for the
	/// harness to deliver; see `CreditReturn`.
	pub fn increment_credit(&mut self, vc: usize, vc_free: bool, tick: Time)
	{
		self.pending_credits.push(CreditReturn{ vc, vc_free, tick });
	}

	/// Drain the credit-return events accumulated this cycle. Test/harness
	/// code uses this to apply them to the upstream router's `OutputUnit`.
	pub fn drain_credit_returns(&mut self) -> Vec<CreditReturn>
	{
		std::mem::take(&mut self.pending_credits)
	}
}

/// One output virtual channel: whether it is currently bound to a flow, and
/// how many credits (free downstream buffer slots) it has.
#[derive(Debug,Clone,Copy)]
pub struct OutputVc
{
	allocated: bool,
	credit: i32,
}

impl OutputVc
{
	fn new(initial_credit: i32) -> OutputVc
	{
		OutputVc{ allocated: false, credit: initial_credit }
	}
}

/// One output port: its direction name, the per-vnet VC layout, and one
/// `OutputVc` per virtual channel.
#[derive(Debug)]
pub struct OutputUnit
{
	direction: String,
	vcs: Vec<OutputVc>,
	vcs_per_vnet: usize,
}

impl OutputUnit
{
	pub fn new(direction: &str, num_vcs: usize, vcs_per_vnet: usize, initial_credit: i32) -> OutputUnit
	{
		OutputUnit{
			direction: direction.to_string(),
			vcs: (0..num_vcs).map(|_| OutputVc::new(initial_credit)).collect(),
			vcs_per_vnet,
		}
	}

	pub fn get_direction(&self) -> &str
	{
		&self.direction
	}
	pub fn set_direction(&mut self, direction: &str)
	{
		self.direction = direction.to_string();
	}

	fn vnet_range(&self, vnet: usize) -> std::ops::Range<usize>
	{
		vnet*self.vcs_per_vnet .. (vnet+1)*self.vcs_per_vnet
	}
	fn first_half_range(&self, vnet: usize) -> std::ops::Range<usize>
	{
		let base = vnet*self.vcs_per_vnet;
		base .. base + self.vcs_per_vnet/2
	}
	fn second_half_range(&self, vnet: usize) -> std::ops::Range<usize>
	{
		let base = vnet*self.vcs_per_vnet;
		base + self.vcs_per_vnet/2 .. base + self.vcs_per_vnet
	}

	pub fn has_free_vc(&self, vnet: usize) -> bool
	{
		self.vnet_range(vnet).any(|vc| !self.vcs[vc].allocated)
	}
	pub fn first_has_free_vc(&self, vnet: usize) -> bool
	{
		self.first_half_range(vnet).any(|vc| !self.vcs[vc].allocated)
	}
	pub fn second_has_free_vc(&self, vnet: usize) -> bool
	{
		self.second_half_range(vnet).any(|vc| !self.vcs[vc].allocated)
	}

	fn select_free_vc_in(&mut self, range: std::ops::Range<usize>) -> Option<usize>
	{
		let vc = range.clone().find(|&vc| !self.vcs[vc].allocated)?;
		self.vcs[vc].allocated = true;
		Some(vc)
	}
	pub fn select_free_vc(&mut self, vnet: usize) -> Option<usize>
	{
		let range = self.vnet_range(vnet);
		self.select_free_vc_in(range)
	}
	pub fn first_select_free_vc(&mut self, vnet: usize) -> Option<usize>
	{
		let range = self.first_half_range(vnet);
		self.select_free_vc_in(range)
	}
	pub fn second_select_free_vc(&mut self, vnet: usize) -> Option<usize>
	{
		let range = self.second_half_range(vnet);
		self.select_free_vc_in(range)
	}

	pub fn has_credit(&self, outvc: usize) -> bool
	{
		self.vcs[outvc].credit > 0
	}
	pub fn has_vc_with_credits(&self, vnet: usize) -> bool
	{
		self.vnet_range(vnet).any(|vc| self.vcs[vc].credit > 0)
	}
	pub fn select_vc_with_credits(&mut self, vnet: usize) -> Option<usize>
	{
		let vc = self.vnet_range(vnet).find(|&vc| self.vcs[vc].credit > 0)?;
		self.vcs[vc].allocated = true;
		Some(vc)
	}

	/// Decrement credit on `outvc`. Per the credit-safety invariant, never
	/// called when the credit is already zero (the allocator only reaches
	/// here after `has_credit`/`has_free_vc` succeeded).
	pub fn decrement_credit(&mut self, outvc: usize)
	{
		assert!(self.vcs[outvc].credit > 0, "decrementing credit on outvc {} with no credit available", outvc);
		self.vcs[outvc].credit -= 1;
	}

	/// Apply a credit return received from the downstream router. This is
	/// the receiving counterpart of `InputUnit::increment_credit`; wiring
	/// the two across the reverse link is harness/test plumbing (see
	/// `CreditReturn`), not part of the routing/allocation core itself.
	pub fn apply_credit(&mut self, outvc: usize, vc_free: bool, max_credit: i32)
	{
		self.vcs[outvc].credit = (self.vcs[outvc].credit + 1).min(max_credit);
		if vc_free
		{
			self.vcs[outvc].allocated = false;
		}
	}

	pub fn credit(&self, outvc: usize) -> i32
	{
		self.vcs[outvc].credit
	}
	pub fn is_allocated(&self, outvc: usize) -> bool
	{
		self.vcs[outvc].allocated
	}
}

/// Convenience used by test fixtures to name ports by direction instead of
/// by raw index.
pub fn direction_index(map: &DirectionMap, name: &str) -> usize
{
	map.index_of(name).unwrap_or_else(|| panic!("direction {} not registered", name))
}

#[cfg(test)]
mod tests
{
	use super::*;
	use std::rc::Rc;
	use crate::flit::{FlitKind, NetDest, RouteInfo};

	fn dummy_flit(kind: FlitKind, enqueue_time: Time) -> Flit
	{
		let route = Rc::new(RouteInfo{
			vnet: 0,
			net_dest: NetDest::new(1),
			src_ni: 0, src_router: 0, dest_ni: 0, dest_router: 0,
			hops_traversed: 0,
		});
		let mut f = Flit::new(kind, 0, enqueue_time, route);
		f.advance_stage(PipelineStage::Sa);
		f
	}

	#[test]
	fn input_vc_ready_and_pop()
	{
		let mut vc = InputVc::default();
		assert!(!vc.is_ready(0));
		vc.push(dummy_flit(FlitKind::HeadTail, 5));
		assert!(vc.is_ready(0));
		assert!(vc.need_stage(PipelineStage::Sa, 0));
		assert_eq!(vc.get_enqueue_time(), 5);
		let f = vc.pop_top_flit();
		assert_eq!(f.kind, FlitKind::HeadTail);
		assert!(!vc.is_ready(0));
	}

	#[test]
	fn output_vc_half_split()
	{
		let mut out = OutputUnit::new("East", 8, 4, 2);
		assert!(out.has_free_vc(0));
		assert!(out.first_has_free_vc(0));
		assert!(out.second_has_free_vc(0));
		// exhaust the first half of vnet 0 (vcs 0,1)
		out.first_select_free_vc(0);
		out.first_select_free_vc(0);
		assert!(!out.first_has_free_vc(0));
		assert!(out.second_has_free_vc(0));
		assert!(out.has_free_vc(0));
	}

	#[test]
	fn credit_round_trip()
	{
		let mut out = OutputUnit::new("East", 4, 4, 2);
		let vc = out.select_free_vc(0).unwrap();
		assert!(out.has_credit(vc));
		out.decrement_credit(vc);
		out.decrement_credit(vc);
		assert!(!out.has_credit(vc));
		out.apply_credit(vc, true, 2);
		assert!(out.has_credit(vc));
		assert!(!out.is_allocated(vc));
	}
}
