//! Codeset 0 word lists.

/// Honorifics with their relative frequency.
pub(super) const HONORIFICS: &[(&str, usize)] = &[
    ("", 2000),
    ("a", 1000),
    ("the", 1000),
    ("this", 1000),
    ("that", 500),
    ("my", 400),
    ("our", 200),
    ("your", 200),
    ("sir", 20),
    ("madam", 20),
    ("doctor", 10),
    ("professor", 10),
    ("captain", 10),
    ("admiral", 5),
    ("general", 5),
    ("lord", 5),
    ("lady", 5),
    ("baron", 3),
    ("baroness", 3),
    ("duke", 3),
    ("duchess", 3),
    ("king", 2),
    ("queen", 2),
    ("prince", 2),
    ("princess", 2),
    ("emperor", 1),
    ("empress", 1),
];

pub(super) const ADJECTIVES: &[&str] = &[
    "able", "absolute", "adept", "agile", "airy", "alert", "amber", "ample", "ancient",
    "arctic", "ardent", "artful", "astute", "atomic", "autumnal", "avid", "azure", "balmy",
    "bold", "boundless", "brave", "breezy", "bright", "brilliant", "brisk", "bronze", "bubbly",
    "buoyant", "calm", "candid", "capable", "carefree", "cheerful", "chilly", "civic",
    "classic", "clever", "coastal", "cobalt", "cosmic", "cozy", "crafty", "crimson", "crisp",
    "curious", "dapper", "daring", "dazzling", "deepSea", "deft", "devoted", "diligent",
    "distant", "downToEarth", "dreamy", "dusky", "dynamic", "eager", "early", "earnest",
    "easyGoing", "electric", "elegant", "emerald", "endless", "epic", "even", "evergreen",
    "exact", "fabled", "fair", "faithful", "fancy", "fearless", "festive", "fiery", "fine",
    "fleet", "floral", "fluent", "focused", "foggy", "fond", "frank", "free", "fresh",
    "friendly", "frosty", "frugal", "gallant", "gentle", "giant", "gifted", "glacial", "glad",
    "gleaming", "global", "glossy", "golden", "graceful", "grand", "grateful", "green",
    "hale", "handy", "happy", "hardy", "harmonic", "hearty", "helpful", "heroic", "hidden",
    "highSpirited", "honest", "hopeful", "humble", "icy", "ideal", "idle", "indigo",
    "inner", "ironclad", "ivory", "jade", "jolly", "jovial", "joyful", "keen", "kind",
    "kindHearted", "knowing", "lavish", "leafy", "level", "light", "likable", "limber",
    "lively", "loyal", "lucid", "lucky", "lunar", "lush", "magnetic", "majestic", "mellow",
    "merry", "mighty", "mindful", "misty", "modest", "mossy", "musical", "mystic", "natural",
    "nautical", "neat", "nimble", "noble", "northern", "novel", "oaken", "ocean", "open",
    "openMinded", "optimal", "orbital", "ornate", "patient", "peaceful", "pearly", "plucky",
    "polar", "polished", "prime", "prompt", "proud", "quaint", "quick", "quiet", "radiant",
    "rapid", "rare", "ready", "regal", "resolute", "restful", "rich", "robust", "rosy",
    "royal", "rustic", "sandy", "sapphire", "scarlet", "serene", "sharp", "shiny", "silent",
    "silver", "simple", "sincere", "sleek", "smart", "snowy", "solar", "solid", "sonic",
    "sparkling", "spirited", "spry", "stable", "stalwart", "starry", "steady", "stellar",
    "stoic", "stormy", "sturdy", "subtle", "sunny", "superb", "swift", "tactful", "tall",
    "teal", "tender", "thrifty", "tidy", "timeless", "tireless", "tranquil", "tropical",
    "true", "trusty", "upbeat", "urban", "valiant", "velvet", "vibrant", "vigilant", "vivid",
    "warm", "wellKnown", "wellRead", "whimsical", "wild", "willing", "windy", "wise",
    "witty", "wondrous", "worthy", "youthful", "zealous", "zesty",
];

pub(super) const NOUNS: &[&str] = &[
    "acorn", "albatross", "anchor", "antelope", "anvil", "apricot", "arch", "aurora",
    "avalanche", "badger", "balloon", "bamboo", "banjo", "basil", "beacon", "beaver",
    "bell", "birch", "bison", "blizzard", "blossom", "boulder", "bramble", "breeze",
    "bridge", "brook", "buffalo", "butterfly", "cactus", "camel", "canary", "candle",
    "canyon", "caribou", "cascade", "castle", "cedar", "chameleon", "cheetah", "chestnut",
    "cinnamon", "clover", "cobra", "comet", "compass", "condor", "coral", "cougar",
    "coyote", "crane", "crater", "cricket", "crystal", "cypress", "daisy", "delta",
    "desert", "dolphin", "downScoopShovel", "dragonfly", "dune", "eagle", "echo", "eclipse",
    "elm", "ember", "falcon", "fern", "ferret", "fjord", "flamingo", "forest", "fountain",
    "fox", "galaxy", "gazelle", "geyser", "ginger", "glacier", "gorilla", "granite",
    "grove", "gull", "harbor", "hawk", "hazel", "hedgehog", "heron", "hillside",
    "horizon", "hummingbird", "iceberg", "ibis", "iguana", "island", "ivy", "jackal",
    "jaguar", "jasmine", "jellyfish", "juniper", "kangaroo", "kestrel", "kiwi", "koala",
    "lagoon", "lantern", "lark", "laurel", "lemur", "leopard", "lighthouse", "lily",
    "lion", "lobster", "lotus", "lynx", "macaw", "magnolia", "mammoth", "mango",
    "maple", "marlin", "meadow", "meteor", "mink", "mongoose", "moose", "mountain",
    "nebula", "nightingale", "oak", "oasis", "ocelot", "octopus", "orchid", "osprey",
    "otter", "owl", "panda", "panther", "parrot", "peacock", "pebble", "pelican",
    "penguin", "pepper", "phoenix", "pine", "planet", "plateau", "plover", "poppy",
    "prairie", "puffin", "puma", "quail", "quartz", "rabbit", "raccoon", "rainbow",
    "raven", "reef", "ridge", "river", "robin", "rocket", "saffron", "salamander",
    "sapling", "sequoia", "shark", "sparrow", "sprout", "squirrel", "starfish", "stork",
    "summit", "sunflower", "swallow", "swan", "sycamore", "tapir", "thistle", "thunder",
    "tiger", "topaz", "tortoise", "toucan", "tulip", "tundra", "turtle", "valley",
    "violet", "volcano", "walnut", "walrus", "waterfall", "whale", "willow", "wolf",
    "wombat", "woodpecker", "wren", "yak", "zebra", "zephyr",
];

/// Display colors, `0x` followed by six upper-case hex digits.
pub(super) const COLORS: &[&str] = &[
    "0x1ABC9C", "0x16A085", "0x2ECC71", "0x27AE60", "0x3498DB", "0x2980B9", "0x9B59B6",
    "0x8E44AD", "0x34495E", "0x2C3E50", "0xF1C40F", "0xF39C12", "0xE67E22", "0xD35400",
    "0xE74C3C", "0xC0392B", "0x95A5A6", "0x7F8C8D", "0x77BFC7", "0x5D9CEC", "0x4A89DC",
    "0xAC92EC", "0x967ADC", "0xEC87C0", "0xD770AD", "0xA0D468", "0x8CC152", "0x48CFAD",
    "0x37BC9B", "0x4FC1E9", "0x3BAFDA", "0xFFCE54", "0xF6BB42", "0xFC6E51", "0xE9573F",
    "0xED5565", "0xDA4453", "0x656D78", "0x434A54", "0xB1D8B7", "0x94C973", "0xFFB347",
    "0xFF6961", "0x779ECB", "0x966FD6", "0xC23B22", "0x03C03C", "0xFDFD96", "0x836953",
    "0xCB99C9",
];
