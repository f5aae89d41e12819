use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use coinop_cpu::ExecuteDevice;
use coinop_snapshot::SaveState;
use tracing::debug;

use crate::interface::{
    InterfaceKind, InterfaceSet, NvramDevice, RtcDevice, SlotInterface, SoundDevice,
};
use crate::reset::ResetLatch;
use crate::tag::DeviceTag;

/// Index handle into a built [`DeviceTree`]. Cross-device references are
/// resolved to these at start time and held as plain values afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(u32);

impl DeviceId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One device in the built tree.
pub struct DeviceNode {
    pub(crate) tag: DeviceTag,
    pub(crate) clock_hz: u64,
    pub(crate) parent: Option<DeviceId>,
    pub(crate) children: Vec<DeviceId>,
    pub(crate) interfaces: InterfaceSet,
    pub(crate) slot_card: Option<DeviceId>,
    pub(crate) reset_hook: Option<Box<dyn FnMut()>>,
}

impl DeviceNode {
    #[must_use]
    pub fn tag(&self) -> &DeviceTag {
        &self.tag
    }

    #[must_use]
    pub fn clock_hz(&self) -> u64 {
        self.clock_hz
    }

    #[must_use]
    pub fn parent(&self) -> Option<DeviceId> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[DeviceId] {
        &self.children
    }

    #[must_use]
    pub fn has_interface(&self, kind: InterfaceKind) -> bool {
        self.interfaces.has(kind)
    }
}

/// The started machine: every device instantiated, tags resolved, start
/// hooks run. Shape is immutable from here on; only runtime state changes.
pub struct DeviceTree {
    nodes: Vec<DeviceNode>,
    by_tag: HashMap<String, DeviceId>,
    reset_latch: ResetLatch,
}

impl DeviceTree {
    pub(crate) fn from_parts(nodes: Vec<DeviceNode>, by_tag: HashMap<String, DeviceId>) -> Self {
        Self {
            nodes,
            by_tag,
            reset_latch: ResetLatch::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids in device-addition order, which is also start and reset order.
    pub fn ids(&self) -> impl Iterator<Item = DeviceId> + '_ {
        (0..self.nodes.len()).map(DeviceId::new)
    }

    #[must_use]
    pub fn lookup(&self, tag: &str) -> Option<DeviceId> {
        self.by_tag.get(tag).copied()
    }

    /// Panics on a foreign id; `DeviceId`s are only minted by this tree.
    #[must_use]
    pub fn node(&self, id: DeviceId) -> &DeviceNode {
        &self.nodes[id.index()]
    }

    #[must_use]
    pub fn query_execute(&self, id: DeviceId) -> Option<Rc<RefCell<dyn ExecuteDevice>>> {
        self.nodes[id.index()].interfaces.execute.clone()
    }

    #[must_use]
    pub fn query_slot(&self, id: DeviceId) -> Option<Rc<RefCell<dyn SlotInterface>>> {
        self.nodes[id.index()].interfaces.slot.clone()
    }

    #[must_use]
    pub fn query_nvram(&self, id: DeviceId) -> Option<Rc<RefCell<dyn NvramDevice>>> {
        self.nodes[id.index()].interfaces.nvram.clone()
    }

    #[must_use]
    pub fn query_rtc(&self, id: DeviceId) -> Option<Rc<RefCell<dyn RtcDevice>>> {
        self.nodes[id.index()].interfaces.rtc.clone()
    }

    #[must_use]
    pub fn query_sound(&self, id: DeviceId) -> Option<Rc<RefCell<dyn SoundDevice>>> {
        self.nodes[id.index()].interfaces.sound.clone()
    }

    #[must_use]
    pub fn query_snapshot(&self, id: DeviceId) -> Option<Rc<RefCell<dyn SaveState>>> {
        self.nodes[id.index()].interfaces.snapshot.clone()
    }

    /// Card device attached to `slot` under the configured option. `None`
    /// when the slot is empty or `slot` is not a slot device at all.
    #[must_use]
    pub fn get_card_device(&self, slot: DeviceId) -> Option<DeviceId> {
        self.nodes[slot.index()].slot_card
    }

    /// Devices with an execute interface, in deterministic id order. This
    /// is the scheduler's run list.
    pub fn execute_devices(
        &self,
    ) -> impl Iterator<Item = (DeviceId, Rc<RefCell<dyn ExecuteDevice>>)> + '_ {
        self.ids()
            .filter_map(|id| self.query_execute(id).map(|dev| (id, dev)))
    }

    /// Devices with a snapshot interface, in deterministic id order.
    pub fn snapshot_devices(
        &self,
    ) -> impl Iterator<Item = (DeviceId, Rc<RefCell<dyn SaveState>>)> + '_ {
        self.ids()
            .filter_map(|id| self.query_snapshot(id).map(|dev| (id, dev)))
    }

    /// Runs every device's reset hook in id order. Repeatable; does not
    /// change tree shape.
    pub fn reset(&mut self) {
        debug!("resetting {} devices", self.nodes.len());
        for node in &mut self.nodes {
            if let Some(hook) = node.reset_hook.as_mut() {
                hook();
            }
        }
    }

    /// Clonable handle devices use to request a machine reset from handler
    /// context.
    #[must_use]
    pub fn reset_latch(&self) -> ResetLatch {
        self.reset_latch.clone()
    }
}
