use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Stock,
    Forex,
    Crypto,
    Commodity,
}

impl AssetClass {
    pub const ALL: [AssetClass; 4] = [
        AssetClass::Stock,
        AssetClass::Forex,
        AssetClass::Crypto,
        AssetClass::Commodity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stock => "stock",
            Self::Forex => "forex",
            Self::Crypto => "crypto",
            Self::Commodity => "commodity",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instrument {
    /// Identifier as the quote provider knows it (e.g. `EURUSD=X`, `GC=F`).
    pub symbol: String,
    pub name: String,
    pub asset_class: AssetClass,
}

impl Instrument {
    pub fn new(symbol: &str, name: &str, asset_class: AssetClass) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
            asset_class,
        }
    }
}

const BUILTIN: &[(&str, &str, AssetClass)] = &[
    ("AAPL", "Apple Inc.", AssetClass::Stock),
    ("MSFT", "Microsoft Corporation", AssetClass::Stock),
    ("AMZN", "Amazon.com Inc.", AssetClass::Stock),
    ("GOOGL", "Alphabet Inc.", AssetClass::Stock),
    ("META", "Meta Platforms Inc.", AssetClass::Stock),
    ("TSLA", "Tesla Inc.", AssetClass::Stock),
    ("NVDA", "NVIDIA Corporation", AssetClass::Stock),
    ("EURUSD=X", "EUR/USD", AssetClass::Forex),
    ("GBPUSD=X", "GBP/USD", AssetClass::Forex),
    ("USDJPY=X", "USD/JPY", AssetClass::Forex),
    ("AUDUSD=X", "AUD/USD", AssetClass::Forex),
    ("BTC-USD", "Bitcoin USD", AssetClass::Crypto),
    ("ETH-USD", "Ethereum USD", AssetClass::Crypto),
    ("XRP-USD", "Ripple USD", AssetClass::Crypto),
    ("SOL-USD", "Solana USD", AssetClass::Crypto),
    ("GC=F", "Gold", AssetClass::Commodity),
    ("SI=F", "Silver", AssetClass::Commodity),
    ("CL=F", "Crude Oil", AssetClass::Commodity),
    ("NG=F", "Natural Gas", AssetClass::Commodity),
];

/// Immutable catalog of supported instruments, built once at startup and
/// shared read-only.
///
/// Registry order is meaningful: it drives the default selection and the
/// order of `/api/assets`.
#[derive(Debug, Clone)]
pub struct InstrumentRegistry {
    instruments: Vec<Instrument>,
    by_symbol: HashMap<String, usize>,
}

impl InstrumentRegistry {
    /// Duplicate symbols keep their first occurrence.
    pub fn new(instruments: Vec<Instrument>) -> Self {
        let mut kept = Vec::with_capacity(instruments.len());
        let mut by_symbol = HashMap::with_capacity(instruments.len());
        for inst in instruments {
            if by_symbol.contains_key(&inst.symbol) {
                continue;
            }
            by_symbol.insert(inst.symbol.clone(), kept.len());
            kept.push(inst);
        }
        Self {
            instruments: kept,
            by_symbol,
        }
    }

    pub fn builtin() -> Self {
        Self::new(
            BUILTIN
                .iter()
                .map(|(symbol, name, class)| Instrument::new(symbol, name, *class))
                .collect(),
        )
    }

    pub fn get(&self, symbol: &str) -> Option<&Instrument> {
        self.by_symbol.get(symbol).map(|&i| &self.instruments[i])
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.by_symbol.contains_key(symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.iter()
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// First `per_class` instruments of each asset class in registry order,
    /// truncated to `cap` overall.
    pub fn default_selection(&self, per_class: usize, cap: usize) -> Vec<&Instrument> {
        let mut taken: HashMap<AssetClass, usize> = HashMap::new();
        let mut out = Vec::new();
        for inst in &self.instruments {
            if out.len() >= cap {
                break;
            }
            let n = taken.entry(inst.asset_class).or_insert(0);
            if *n < per_class {
                *n += 1;
                out.push(inst);
            }
        }
        out
    }
}

impl Default for InstrumentRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[derive(Serialize)]
struct RegistryEntry<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    asset_class: AssetClass,
}

// symbol -> {name, type}, kept in registry order.
impl Serialize for InstrumentRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.instruments.len()))?;
        for inst in &self.instruments {
            map.serialize_entry(
                &inst.symbol,
                &RegistryEntry {
                    name: &inst.name,
                    asset_class: inst.asset_class,
                },
            )?;
        }
        map.end()
    }
}
