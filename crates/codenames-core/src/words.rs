use serde::{Deserialize, Serialize};

/// A selectable word pack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pack {
    Base,
    Duet,
    Undercover,
    Custom,
    Nsfw,
}

impl Pack {
    pub fn all() -> &'static [Pack] {
        &[
            Pack::Base,
            Pack::Duet,
            Pack::Undercover,
            Pack::Custom,
            Pack::Nsfw,
        ]
    }

    pub fn words(&self) -> &'static [&'static str] {
        match self {
            Pack::Base => BASE,
            Pack::Duet => DUET,
            Pack::Undercover => UNDERCOVER,
            Pack::Custom => CUSTOM,
            Pack::Nsfw => NSFW,
        }
    }
}

/// Pack inclusion flags. At least one flag is expected to be set; callers
/// toggling packs restore `base` when everything is switched off.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packs {
    pub base: bool,
    pub duet: bool,
    pub undercover: bool,
    pub custom: bool,
    pub nsfw: bool,
}

impl Default for Packs {
    fn default() -> Self {
        Self {
            base: true,
            duet: false,
            undercover: false,
            custom: false,
            nsfw: false,
        }
    }
}

impl Packs {
    pub fn is_enabled(&self, pack: Pack) -> bool {
        match pack {
            Pack::Base => self.base,
            Pack::Duet => self.duet,
            Pack::Undercover => self.undercover,
            Pack::Custom => self.custom,
            Pack::Nsfw => self.nsfw,
        }
    }

    pub fn toggle(&mut self, pack: Pack) {
        let flag = match pack {
            Pack::Base => &mut self.base,
            Pack::Duet => &mut self.duet,
            Pack::Undercover => &mut self.undercover,
            Pack::Custom => &mut self.custom,
            Pack::Nsfw => &mut self.nsfw,
        };
        *flag = !*flag;
    }

    pub fn any(&self) -> bool {
        Pack::all().iter().any(|p| self.is_enabled(*p))
    }
}

/// Collect the deduplicated word pool for the enabled packs, in pack order.
pub fn build_pool(packs: &Packs) -> Vec<String> {
    let mut pool: Vec<String> = Vec::new();
    for pack in Pack::all() {
        if !packs.is_enabled(*pack) {
            continue;
        }
        for word in pack.words() {
            if !pool.iter().any(|w| w == word) {
                pool.push((*word).to_string());
            }
        }
    }
    pool
}

const BASE: &[&str] = &[
    "Africa", "Agent", "Air", "Alien", "Alps", "Amazon", "Ambulance", "America",
    "Angel", "Antarctica", "Apple", "Arm", "Atlantis", "Australia", "Aztec",
    "Back", "Ball", "Band", "Bank", "Bar", "Bark", "Bat", "Battery", "Beach",
    "Bear", "Beat", "Bed", "Beijing", "Bell", "Belt", "Berlin", "Bermuda",
    "Berry", "Bill", "Block", "Board", "Bolt", "Bomb", "Bond", "Boom", "Boot",
    "Bottle", "Bow", "Box", "Bridge", "Brush", "Buck", "Buffalo", "Bug",
    "Bugle", "Button", "Calf", "Canada", "Cap", "Capital", "Car", "Card",
    "Carrot", "Casino", "Cast", "Cat", "Cell", "Centaur", "Center", "Chair",
];

const DUET: &[&str] = &[
    "Accident", "Ash", "Avalanche", "Bacon", "Bag", "Balloon", "Banana",
    "Barbecue", "Bath", "Beard", "Bee", "Big Bang", "Biscuit", "Blacksmith",
    "Blade", "Blind", "Blizzard", "Bowler", "Brain", "Brick", "Bride",
    "Bubble", "Bulb", "Bunk", "Butter", "Cake", "Camp", "Cane", "Captain",
    "Cartoon",
];

const UNDERCOVER: &[&str] = &[
    "Acne", "Aerobics", "Alcohol", "Anchovy", "Armpit", "Bachelor", "Bar Tab",
    "Beer", "Bikini", "Blind Date", "Boxers", "Bra", "Breakup", "Bubble Bath",
    "Cologne", "Cocktail", "Cramp", "Dandruff", "Diaper", "Divorce", "Dumpster",
    "Flirt", "Gossip", "Hangover", "Hickey", "Karaoke", "Mullet", "Pajamas",
    "Pimple", "Selfie",
];

const CUSTOM: &[&str] = &[
    "Airship", "Anthem", "Arcade", "Astronaut", "Backpack", "Bagpipe",
    "Bandwidth", "Barcode", "Blender", "Blockchain", "Bluetooth", "Bonfire",
    "Boomerang", "Campfire", "Carousel", "Chatbot", "Compass", "Cyborg",
    "Drone", "Emoji", "Firewall", "Glacier", "Hashtag", "Hologram", "Jetpack",
    "Laser", "Meme", "Podcast", "Robot", "Satellite",
];

const NSFW: &[&str] = &[
    "Booty", "Bondage", "Boob", "Condom", "Cuddle", "Fetish", "Foreplay",
    "Frisky", "Handcuffs", "Hooker", "Horny", "Hot Tub", "Kinky", "Lap Dance",
    "Lingerie", "Lube", "Naked", "Nipple", "One Night Stand", "Orgy",
    "Quickie", "Sexy", "Skinny Dip", "Spank", "Stripper", "Threesome", "Thong",
    "Walk Of Shame", "Whip", "Wink",
];
