//! Built-in word lists
//!
//! Valences follow the usual -4..4 scale. The list is small and tuned for
//! crypto chatter; pass a custom table to `LexiconScorer::with_lexicon` for
//! anything serious.

pub const DEFAULT_LEXICON: &[(&str, f64)] = &[
    // general positive
    ("good", 1.9),
    ("great", 3.1),
    ("excellent", 2.7),
    ("amazing", 2.8),
    ("awesome", 3.1),
    ("love", 3.2),
    ("like", 1.5),
    ("nice", 1.8),
    ("happy", 2.7),
    ("win", 2.8),
    ("winning", 2.4),
    ("profit", 1.9),
    ("strong", 2.3),
    ("safe", 1.9),
    ("legit", 1.8),
    ("best", 3.2),
    ("solid", 1.7),
    ("huge", 1.3),
    ("gain", 2.0),
    ("gains", 2.0),
    // general negative
    ("bad", -2.5),
    ("terrible", -2.1),
    ("awful", -2.0),
    ("hate", -2.7),
    ("worst", -3.1),
    ("lose", -1.7),
    ("losing", -1.6),
    ("loss", -1.3),
    ("weak", -1.9),
    ("fear", -2.2),
    ("scared", -1.9),
    ("risky", -1.2),
    ("dead", -3.3),
    ("crash", -1.7),
    ("crashing", -2.0),
    ("fail", -2.5),
    ("sad", -2.1),
    ("fake", -2.1),
    ("worthless", -1.9),
    // crypto slang
    ("moon", 2.2),
    ("mooning", 2.5),
    ("bullish", 2.4),
    ("bearish", -2.4),
    ("pump", 1.2),
    ("pumping", 1.6),
    ("dump", -1.8),
    ("dumping", -2.0),
    ("gem", 2.2),
    ("hodl", 1.2),
    ("lfg", 2.0),
    ("wagmi", 2.1),
    ("ngmi", -2.1),
    ("rug", -3.2),
    ("rugged", -3.4),
    ("rugpull", -3.5),
    ("scam", -3.3),
    ("honeypot", -3.0),
    ("fud", -1.6),
    ("rekt", -2.8),
    ("exit", -0.8),
    ("🚀", 2.4),
    ("💎", 1.6),
    ("🔥", 1.9),
    ("📉", -1.9),
    ("💀", -2.2),
];

pub const NEGATIONS: &[&str] = &[
    "not", "no", "never", "none", "nobody", "nothing", "neither", "nor", "without", "cannot",
    "isnt", "arent", "wasnt", "werent", "dont", "doesnt", "didnt", "cant", "wont", "wouldnt",
    "shouldnt", "aint",
];

pub const BOOSTERS: &[&str] = &[
    "very", "really", "extremely", "super", "so", "totally", "absolutely", "incredibly",
    "hugely", "mega", "insanely",
];

pub const DAMPENERS: &[&str] = &[
    "slightly", "somewhat", "barely", "kinda", "kind", "sorta", "little", "marginally",
    "hardly",
];
