use crate::spr;

/// Silicon classes with observably different SPR sets and supervisor
/// models. The 403 is the embedded 4xx part the arcade boards carry; the
/// 60x parts differ among themselves mostly in 601 legacy registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flavor {
    Ppc403,
    Ppc601,
    Ppc602,
    Ppc603,
}

impl Flavor {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Flavor::Ppc403 => "ppc403",
            Flavor::Ppc601 => "ppc601",
            Flavor::Ppc602 => "ppc602",
            Flavor::Ppc603 => "ppc603",
        }
    }

    #[inline]
    #[must_use]
    pub fn is_4xx(self) -> bool {
        self == Flavor::Ppc403
    }

    /// Whether this flavor implements `spr`. Anything not listed is
    /// treated as absent, which downstream consumers turn into an
    /// interpreter fallback rather than a guess.
    #[must_use]
    pub fn has_spr(self, spr: u32) -> bool {
        match spr {
            spr::XER | spr::LR | spr::CTR => true,
            spr::SRR0 | spr::SRR1 => true,
            spr::SPRG0 | spr::SPRG1 | spr::SPRG2 | spr::SPRG3 | spr::PVR => true,

            // 601 legacy: MQ and the real-time clock pair.
            spr::MQ | spr::RTCU | spr::RTCL => self == Flavor::Ppc601,

            // 60x supervisor state; the 403 has PIT/EVPR instead.
            spr::DSISR | spr::DAR | spr::SDR1 => !self.is_4xx(),
            spr::DEC => !self.is_4xx(),

            // Time base writes: the 601 exposes the RTC instead.
            spr::TBL_W | spr::TBU_W => matches!(self, Flavor::Ppc602 | Flavor::Ppc603),

            // 4xx embedded set. 990/991 double as the 602's SEBR/SER.
            spr::ESR | spr::DEAR | spr::EVPR | spr::TSR | spr::TCR | spr::PIT => self.is_4xx(),
            spr::SRR2 | spr::SRR3 => matches!(self, Flavor::Ppc403 | Flavor::Ppc602),

            _ => false,
        }
    }
}
