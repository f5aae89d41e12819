use std::cell::RefCell;
use std::rc::Rc;

use coinop_cpu::ExecuteDevice;
use coinop_snapshot::SaveState;

/// Capability kinds a device can register. At most one instance per kind
/// per device; attaching a second is a configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceKind {
    Execute,
    Slot,
    Nvram,
    Rtc,
    Sound,
    Snapshot,
}

/// Capability of devices that accept plug-in cards.
///
/// The slot declares which option names it accepts; the machine description
/// adds the card device for the selected option as a child tagged
/// `<slot>:<option>`. Resolution happens at build time and is queried
/// through [`DeviceTree::get_card_device`].
///
/// [`DeviceTree::get_card_device`]: crate::DeviceTree::get_card_device
pub trait SlotInterface {
    /// Accepted option names. Include `"none"` if the slot may be empty.
    fn option_names(&self) -> &[&'static str];

    /// Option selected when neither [`MachineOptions`] nor the machine
    /// description picks one.
    ///
    /// [`MachineOptions`]: crate::MachineOptions
    fn default_option(&self) -> &'static str;
}

/// Capability of devices with battery-backed storage.
pub trait NvramDevice {
    /// Applies factory-default contents, used when no backup exists.
    fn nvram_default(&mut self);

    /// Serializes the backing store for persistence.
    fn nvram_read(&self) -> Vec<u8>;

    /// Restores the backing store from a persisted blob. Implementations
    /// tolerate short blobs (the device shipped with a larger store in a
    /// later revision) by filling the tail with defaults.
    fn nvram_write(&mut self, data: &[u8]);
}

/// Calendar time pushed into an RTC at machine start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtcTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// Capability of battery-backed clock devices. These usually register
/// [`InterfaceKind::Nvram`] as well, which is the motivating case for
/// capability composition over inheritance.
pub trait RtcDevice {
    fn rtc_set_time(&mut self, time: RtcTime);

    /// Advances one second of wall-clock time.
    fn rtc_tick(&mut self);
}

/// Capability of sample-producing devices.
pub trait SoundDevice {
    /// Fills `out` with the next mono samples at the device's native rate.
    fn sound_update(&mut self, out: &mut [i16]);
}

/// The per-device capability registry: one optional handle per kind.
#[derive(Clone, Default)]
pub struct InterfaceSet {
    pub(crate) execute: Option<Rc<RefCell<dyn ExecuteDevice>>>,
    pub(crate) slot: Option<Rc<RefCell<dyn SlotInterface>>>,
    pub(crate) nvram: Option<Rc<RefCell<dyn NvramDevice>>>,
    pub(crate) rtc: Option<Rc<RefCell<dyn RtcDevice>>>,
    pub(crate) sound: Option<Rc<RefCell<dyn SoundDevice>>>,
    pub(crate) snapshot: Option<Rc<RefCell<dyn SaveState>>>,
}

impl InterfaceSet {
    #[must_use]
    pub fn has(&self, kind: InterfaceKind) -> bool {
        match kind {
            InterfaceKind::Execute => self.execute.is_some(),
            InterfaceKind::Slot => self.slot.is_some(),
            InterfaceKind::Nvram => self.nvram.is_some(),
            InterfaceKind::Rtc => self.rtc.is_some(),
            InterfaceKind::Sound => self.sound.is_some(),
            InterfaceKind::Snapshot => self.snapshot.is_some(),
        }
    }
}

impl std::fmt::Debug for InterfaceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kinds = [
            InterfaceKind::Execute,
            InterfaceKind::Slot,
            InterfaceKind::Nvram,
            InterfaceKind::Rtc,
            InterfaceKind::Sound,
            InterfaceKind::Snapshot,
        ];
        f.debug_set()
            .entries(kinds.into_iter().filter(|k| self.has(*k)))
            .finish()
    }
}
