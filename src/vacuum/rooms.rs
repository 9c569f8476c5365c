use thiserror::Error;

/// Segment ids as they appear on the vacuum's saved map.
const DEFAULT_SEGMENTS: [(&str, u32); 11] = [
    ("Bedroom4", 16),
    ("Balcony", 17),
    ("Bedroom3", 18),
    ("Bathroom", 19),
    ("Hallway", 20),
    ("demobooth", 21),
    ("Dining Room", 22),
    ("Entryway", 23),
    ("Bedroom1", 24),
    ("Bedroom2", 25),
    ("Living Room", 26),
];

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Unknown room: {0}")]
pub struct UnknownRoom(pub String);

#[derive(Debug, Clone, PartialEq)]
pub struct Room {
    pub name: String,
    pub segment: u32,
}

/// Static room name → segment id table. Lookups ignore case and
/// surrounding whitespace.
#[derive(Debug, Clone)]
pub struct RoomMap {
    rooms: Vec<Room>,
}

impl RoomMap {
    pub fn new(rooms: Vec<Room>) -> Self {
        let mut rooms = rooms;
        rooms.sort_by_key(|room| room.segment);
        Self { rooms }
    }

    /// Parse a `Name=id,Name=id` list
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut rooms = Vec::new();

        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (name, id) = entry
                .split_once('=')
                .ok_or_else(|| format!("entry '{}' is not in Name=id form", entry))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(format!("entry '{}' has an empty room name", entry));
            }
            let segment: u32 = id
                .trim()
                .parse()
                .map_err(|_| format!("segment id '{}' for {} is not a number", id.trim(), name))?;
            if segment == 0 {
                return Err(format!("segment id for {} must be positive", name));
            }
            if rooms.iter().any(|r: &Room| r.name.eq_ignore_ascii_case(name)) {
                return Err(format!("room {} is listed twice", name));
            }
            rooms.push(Room {
                name: name.to_string(),
                segment,
            });
        }

        if rooms.is_empty() {
            return Err("no rooms listed".to_string());
        }
        Ok(Self::new(rooms))
    }

    pub fn segment_for(&self, name: &str) -> Option<u32> {
        let name = name.trim();
        self.rooms
            .iter()
            .find(|room| room.name.eq_ignore_ascii_case(name))
            .map(|room| room.segment)
    }

    /// Resolve room names to segment ids, keeping request order and
    /// dropping repeats.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<u32>, UnknownRoom> {
        let mut segments = Vec::with_capacity(names.len());
        for name in names {
            let segment = self
                .segment_for(name.as_ref())
                .ok_or_else(|| UnknownRoom(name.as_ref().trim().to_string()))?;
            if !segments.contains(&segment) {
                segments.push(segment);
            }
        }
        Ok(segments)
    }

    /// All rooms, ordered by segment id
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }
}

impl Default for RoomMap {
    fn default() -> Self {
        Self::new(
            DEFAULT_SEGMENTS
                .iter()
                .map(|(name, segment)| Room {
                    name: name.to_string(),
                    segment: *segment,
                })
                .collect(),
        )
    }
}
