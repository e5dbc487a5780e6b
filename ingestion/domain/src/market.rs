use chrono_tz::Tz;

/// A bidding zone whose day-ahead auction results are ingested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Market {
    code: &'static str,
    eic: &'static str,
    timezone: Tz,
}

impl Market {
    pub const FINLAND: Market = Market {
        code: "FI",
        eic: "10YFI-1--------U",
        timezone: chrono_tz::Europe::Helsinki,
    };

    pub fn code(&self) -> &'static str {
        self.code
    }

    /// ENTSO-E area identifier, used as both in- and out-domain of the query.
    pub fn eic(&self) -> &'static str {
        self.eic
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }
}

impl Default for Market {
    fn default() -> Self {
        Self::FINLAND
    }
}
