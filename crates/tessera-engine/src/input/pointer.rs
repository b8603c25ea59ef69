/// Last-known pointer position (surface pixels) and edge-triggered button
/// state. Overwritten by each event; nothing is queued.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct PointerState {
    pub x: f32,
    pub y: f32,
    pub down: bool,
    pub up: bool,
}

impl PointerState {
    pub fn press(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
        self.down = true;
        self.up = false;
    }

    pub fn release(&mut self) {
        self.down = false;
        self.up = true;
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
    }
}
