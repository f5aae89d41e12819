//! Save-state plumbing for the core.

use coinop_snapshot::{codec, DeviceSnapshot, SnapshotReader, SnapshotResult, SnapshotVersion, SnapshotWriter};
use coinop_types::LineState;

use crate::interp::Ppc403;

const TAG_GPR: u16 = 1;
const TAG_PC: u16 = 2;
const TAG_MSR: u16 = 3;
const TAG_CR: u16 = 4;
const TAG_LR: u16 = 5;
const TAG_CTR: u16 = 6;
const TAG_XER: u16 = 7;
const TAG_SRR0: u16 = 8;
const TAG_SRR1: u16 = 9;
const TAG_SRR2: u16 = 10;
const TAG_SRR3: u16 = 11;
const TAG_SPRG: u16 = 12;
const TAG_EVPR: u16 = 13;
const TAG_ESR: u16 = 14;
const TAG_DEAR: u16 = 15;
const TAG_PIT: u16 = 16;
const TAG_TSR: u16 = 17;
const TAG_TCR: u16 = 18;
const TAG_IRQ: u16 = 19;
const TAG_TOTAL: u16 = 20;

impl DeviceSnapshot for Ppc403 {
    const DEVICE_ID: [u8; 4] = *b"P403";
    const DEVICE_VERSION: SnapshotVersion = SnapshotVersion::new(1, 0);

    fn save_state(&self) -> Vec<u8> {
        let regs = self.regs();
        let mut w = SnapshotWriter::new(Self::DEVICE_ID, Self::DEVICE_VERSION);

        let mut gpr = codec::Encoder::new();
        for &g in &regs.gpr {
            gpr = gpr.u32(g);
        }
        w.field_bytes(TAG_GPR, gpr.finish());

        let mut sprg = codec::Encoder::new();
        for &s in &regs.sprg {
            sprg = sprg.u32(s);
        }
        w.field_bytes(TAG_SPRG, sprg.finish());

        w.field_u32(TAG_PC, regs.pc);
        w.field_u32(TAG_MSR, regs.msr);
        w.field_u32(TAG_CR, regs.cr);
        w.field_u32(TAG_LR, regs.lr);
        w.field_u32(TAG_CTR, regs.ctr);
        w.field_u32(TAG_XER, regs.xer);
        w.field_u32(TAG_SRR0, regs.srr0);
        w.field_u32(TAG_SRR1, regs.srr1);
        w.field_u32(TAG_SRR2, regs.srr2);
        w.field_u32(TAG_SRR3, regs.srr3);
        w.field_u32(TAG_EVPR, regs.evpr);
        w.field_u32(TAG_ESR, regs.esr);
        w.field_u32(TAG_DEAR, regs.dear);
        w.field_u32(TAG_PIT, regs.pit);
        w.field_u32(TAG_TSR, regs.tsr);
        w.field_u32(TAG_TCR, regs.tcr);
        w.field_u8(TAG_IRQ, u8::from(self.irq_level().is_asserted()));
        w.field_u64(TAG_TOTAL, self.total());
        w.finish()
    }

    fn load_state(&mut self, bytes: &[u8]) -> SnapshotResult<()> {
        let r = SnapshotReader::parse(bytes, Self::DEVICE_ID)?;
        r.ensure_device_major(Self::DEVICE_VERSION.major)?;

        if let Some(b) = r.bytes(TAG_GPR) {
            let mut d = codec::Decoder::new(b);
            for g in self.regs_mut().gpr.iter_mut() {
                *g = d.u32()?;
            }
            d.finish()?;
        }
        if let Some(b) = r.bytes(TAG_SPRG) {
            let mut d = codec::Decoder::new(b);
            for s in self.regs_mut().sprg.iter_mut() {
                *s = d.u32()?;
            }
            d.finish()?;
        }
        if let Some(v) = r.u32(TAG_PC)? {
            self.regs_mut().pc = v;
        }
        if let Some(v) = r.u32(TAG_MSR)? {
            self.regs_mut().msr = v;
        }
        if let Some(v) = r.u32(TAG_CR)? {
            self.regs_mut().cr = v;
        }
        if let Some(v) = r.u32(TAG_LR)? {
            self.regs_mut().lr = v;
        }
        if let Some(v) = r.u32(TAG_CTR)? {
            self.regs_mut().ctr = v;
        }
        if let Some(v) = r.u32(TAG_XER)? {
            self.regs_mut().xer = v;
        }
        if let Some(v) = r.u32(TAG_SRR0)? {
            self.regs_mut().srr0 = v;
        }
        if let Some(v) = r.u32(TAG_SRR1)? {
            self.regs_mut().srr1 = v;
        }
        if let Some(v) = r.u32(TAG_SRR2)? {
            self.regs_mut().srr2 = v;
        }
        if let Some(v) = r.u32(TAG_SRR3)? {
            self.regs_mut().srr3 = v;
        }
        if let Some(v) = r.u32(TAG_EVPR)? {
            self.regs_mut().evpr = v;
        }
        if let Some(v) = r.u32(TAG_ESR)? {
            self.regs_mut().esr = v;
        }
        if let Some(v) = r.u32(TAG_DEAR)? {
            self.regs_mut().dear = v;
        }
        if let Some(v) = r.u32(TAG_PIT)? {
            self.regs_mut().pit = v;
        }
        if let Some(v) = r.u32(TAG_TSR)? {
            self.regs_mut().tsr = v;
        }
        if let Some(v) = r.u32(TAG_TCR)? {
            self.regs_mut().tcr = v;
        }
        if let Some(v) = r.u8(TAG_IRQ)? {
            let level = if v != 0 {
                LineState::Assert
            } else {
                LineState::Clear
            };
            self.irq_line().set(level);
        }
        if let Some(v) = r.u64(TAG_TOTAL)? {
            self.set_total(v);
        }
        Ok(())
    }
}
