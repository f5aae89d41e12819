use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use coinop_cpu::ExecuteDevice;
use coinop_snapshot::SaveState;
use thiserror::Error;
use tracing::debug;

use crate::interface::{
    InterfaceKind, InterfaceSet, NvramDevice, RtcDevice, SlotInterface, SoundDevice,
};
use crate::options::MachineOptions;
use crate::tag::DeviceTag;
use crate::tree::{DeviceId, DeviceNode, DeviceTree};

/// Static wiring mistakes in a machine description. All of them are fatal
/// at [`MachineConfig::build`]; none can occur later.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid device tag {tag:?}")]
    InvalidTag { tag: String },
    #[error("duplicate device tag {tag:?}")]
    DuplicateTag { tag: String },
    #[error("device {tag:?} requires missing parent {parent:?}")]
    MissingParent { tag: String, parent: String },
    #[error("device {tag:?} registered {kind:?} twice")]
    DuplicateInterface { tag: String, kind: InterfaceKind },
    #[error("device {tag:?} has no {kind:?} interface")]
    MissingInterface { tag: String, kind: InterfaceKind },
    #[error("slot {tag:?} does not accept option {option:?}")]
    UnknownSlotOption { tag: String, option: String },
    #[error("slot {tag:?} selects option with no card device {card:?}")]
    MissingCard { tag: String, card: String },
    #[error("unknown device tag {tag:?}")]
    UnknownTag { tag: String },
}

type StartFn = Box<dyn FnOnce(&DeviceTree) -> Result<(), ConfigError>>;
type ResetFn = Box<dyn FnMut()>;

struct PendingDevice {
    tag: String,
    clock_hz: u64,
    interfaces: InterfaceSet,
    default_card: Option<String>,
    start: Option<StartFn>,
    reset: Option<ResetFn>,
}

/// The configuring phase of a machine: an ordered list of devices plus
/// their interfaces and hooks. Errors found while chaining builder calls
/// are recorded and surface from [`build`], so descriptions read straight
/// through without per-call `?`.
///
/// [`build`]: MachineConfig::build
#[derive(Default)]
pub struct MachineConfig {
    devices: Vec<PendingDevice>,
    errors: Vec<ConfigError>,
}

impl MachineConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a device and returns its builder. Device-addition order is the
    /// tree's id, start, reset and scheduling order.
    pub fn add_device(&mut self, tag: &str, clock_hz: u64) -> DeviceBuilder<'_> {
        self.devices.push(PendingDevice {
            tag: tag.to_owned(),
            clock_hz,
            interfaces: InterfaceSet::default(),
            default_card: None,
            start: None,
            reset: None,
        });
        let index = self.devices.len() - 1;
        DeviceBuilder { cfg: self, index }
    }

    /// Validates the whole description, assembles the tree, and runs every
    /// start hook in device order. The first wiring mistake aborts the
    /// build.
    pub fn build(mut self, options: &MachineOptions) -> Result<DeviceTree, ConfigError> {
        if let Some(err) = self.errors.first() {
            return Err(err.clone());
        }

        let count = self.devices.len();
        let mut tags: Vec<DeviceTag> = Vec::with_capacity(count);
        let mut by_tag: HashMap<String, DeviceId> = HashMap::with_capacity(count);
        for (i, dev) in self.devices.iter().enumerate() {
            let tag = DeviceTag::parse(&dev.tag).ok_or_else(|| ConfigError::InvalidTag {
                tag: dev.tag.clone(),
            })?;
            if by_tag.insert(dev.tag.clone(), DeviceId::new(i)).is_some() {
                return Err(ConfigError::DuplicateTag {
                    tag: dev.tag.clone(),
                });
            }
            tags.push(tag);
        }

        let mut parents: Vec<Option<DeviceId>> = Vec::with_capacity(count);
        let mut children: Vec<Vec<DeviceId>> = vec![Vec::new(); count];
        for (i, tag) in tags.iter().enumerate() {
            let parent = match tag.parent() {
                Some(path) => {
                    let id = by_tag
                        .get(path)
                        .copied()
                        .ok_or_else(|| ConfigError::MissingParent {
                            tag: tag.as_str().to_owned(),
                            parent: path.to_owned(),
                        })?;
                    children[id.index()].push(DeviceId::new(i));
                    Some(id)
                }
                None => None,
            };
            parents.push(parent);
        }

        let mut slot_cards: Vec<Option<DeviceId>> = vec![None; count];
        for (i, dev) in self.devices.iter().enumerate() {
            if dev.default_card.is_some() && dev.interfaces.slot.is_none() {
                return Err(ConfigError::MissingInterface {
                    tag: dev.tag.clone(),
                    kind: InterfaceKind::Slot,
                });
            }
            let Some(slot) = dev.interfaces.slot.clone() else {
                continue;
            };
            let slot = slot.borrow();
            let selected = options
                .slot_selection(&dev.tag)
                .or(dev.default_card.as_deref())
                .unwrap_or_else(|| slot.default_option());
            if !slot.option_names().contains(&selected) {
                return Err(ConfigError::UnknownSlotOption {
                    tag: dev.tag.clone(),
                    option: selected.to_owned(),
                });
            }
            if selected != "none" {
                let card_tag = tags[i].child(selected);
                let card =
                    by_tag
                        .get(&card_tag)
                        .copied()
                        .ok_or_else(|| ConfigError::MissingCard {
                            tag: dev.tag.clone(),
                            card: card_tag.clone(),
                        })?;
                slot_cards[i] = Some(card);
            }
        }

        let mut starts: Vec<(usize, StartFn)> = Vec::new();
        let mut nodes: Vec<DeviceNode> = Vec::with_capacity(count);
        for (i, dev) in self.devices.into_iter().enumerate() {
            if let Some(start) = dev.start {
                starts.push((i, start));
            }
            nodes.push(DeviceNode {
                tag: tags[i].clone(),
                clock_hz: dev.clock_hz,
                parent: parents[i],
                children: std::mem::take(&mut children[i]),
                interfaces: dev.interfaces,
                slot_card: slot_cards[i],
                reset_hook: dev.reset,
            });
        }

        let tree = DeviceTree::from_parts(nodes, by_tag);
        for (i, start) in starts {
            start(&tree)?;
            debug!(tag = %tree.node(DeviceId::new(i)).tag(), "device started");
        }
        Ok(tree)
    }
}

/// Builder for one pending device. Methods chain; mistakes (like attaching
/// the same interface kind twice) are recorded on the config and reported
/// by [`MachineConfig::build`].
pub struct DeviceBuilder<'a> {
    cfg: &'a mut MachineConfig,
    index: usize,
}

impl DeviceBuilder<'_> {
    /// Id this device will have in the built tree.
    #[must_use]
    pub fn id(&self) -> DeviceId {
        DeviceId::new(self.index)
    }

    fn note_duplicate(&mut self, kind: InterfaceKind) {
        let tag = self.cfg.devices[self.index].tag.clone();
        self.cfg
            .errors
            .push(ConfigError::DuplicateInterface { tag, kind });
    }

    pub fn execute(mut self, dev: Rc<RefCell<dyn ExecuteDevice>>) -> Self {
        if self.cfg.devices[self.index].interfaces.execute.is_some() {
            self.note_duplicate(InterfaceKind::Execute);
        } else {
            self.cfg.devices[self.index].interfaces.execute = Some(dev);
        }
        self
    }

    pub fn slot(mut self, iface: Rc<RefCell<dyn SlotInterface>>) -> Self {
        if self.cfg.devices[self.index].interfaces.slot.is_some() {
            self.note_duplicate(InterfaceKind::Slot);
        } else {
            self.cfg.devices[self.index].interfaces.slot = Some(iface);
        }
        self
    }

    pub fn nvram(mut self, dev: Rc<RefCell<dyn NvramDevice>>) -> Self {
        if self.cfg.devices[self.index].interfaces.nvram.is_some() {
            self.note_duplicate(InterfaceKind::Nvram);
        } else {
            self.cfg.devices[self.index].interfaces.nvram = Some(dev);
        }
        self
    }

    pub fn rtc(mut self, dev: Rc<RefCell<dyn RtcDevice>>) -> Self {
        if self.cfg.devices[self.index].interfaces.rtc.is_some() {
            self.note_duplicate(InterfaceKind::Rtc);
        } else {
            self.cfg.devices[self.index].interfaces.rtc = Some(dev);
        }
        self
    }

    pub fn sound(mut self, dev: Rc<RefCell<dyn SoundDevice>>) -> Self {
        if self.cfg.devices[self.index].interfaces.sound.is_some() {
            self.note_duplicate(InterfaceKind::Sound);
        } else {
            self.cfg.devices[self.index].interfaces.sound = Some(dev);
        }
        self
    }

    pub fn snapshot(mut self, dev: Rc<RefCell<dyn SaveState>>) -> Self {
        if self.cfg.devices[self.index].interfaces.snapshot.is_some() {
            self.note_duplicate(InterfaceKind::Snapshot);
        } else {
            self.cfg.devices[self.index].interfaces.snapshot = Some(dev);
        }
        self
    }

    /// Pre-selects a slot option from the machine description.
    /// [`MachineOptions`] still overrides it. Calling this on a device that
    /// never registers a slot interface fails the build.
    pub fn set_default_card(self, option: &str) -> Self {
        self.cfg.devices[self.index].default_card = Some(option.to_owned());
        self
    }

    /// Start hook, run once after the whole tree is assembled. This is
    /// where cross-device tags are resolved. A later call replaces an
    /// earlier one.
    pub fn on_start(
        self,
        f: impl FnOnce(&DeviceTree) -> Result<(), ConfigError> + 'static,
    ) -> Self {
        self.cfg.devices[self.index].start = Some(Box::new(f));
        self
    }

    /// Reset hook, run on every machine reset. A later call replaces an
    /// earlier one.
    pub fn on_reset(self, f: impl FnMut() + 'static) -> Self {
        self.cfg.devices[self.index].reset = Some(Box::new(f));
        self
    }
}
