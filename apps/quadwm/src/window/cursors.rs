use anyhow::Result;
use quadwm_layout::Corner;
use x11rb::connection::Connection;
use x11rb::cursor::Handle;
use x11rb::protocol::xproto::Cursor;
use x11rb::resource_manager::new_from_default;

use crate::backend::CursorShape;

pub struct Cursors {
    pub normal: Cursor,
    pub move_: Cursor,
    pub resize_nw: Cursor,
    pub resize_ne: Cursor,
    pub resize_sw: Cursor,
    pub resize_se: Cursor,
    pub resize_n: Cursor,
    pub resize_s: Cursor,
    pub resize_e: Cursor,
    pub resize_w: Cursor,
}

impl Cursors {
    pub fn new<C: Connection>(conn: &C, screen_num: usize) -> Result<Self> {
        let db = new_from_default(conn)?;
        let handle = Handle::new(conn, screen_num, &db)?.reply()?;

        let load = |name: &str| -> Result<Cursor> { Ok(handle.load_cursor(conn, name)?) };

        Ok(Self {
            normal: load("left_ptr")?,
            move_: load("fleur")?,
            resize_nw: load("top_left_corner")?,
            resize_ne: load("top_right_corner")?,
            resize_sw: load("bottom_left_corner")?,
            resize_se: load("bottom_right_corner")?,
            resize_n: load("top_side")?,
            resize_s: load("bottom_side")?,
            resize_e: load("right_side")?,
            resize_w: load("left_side")?,
        })
    }

    pub fn for_shape(&self, shape: CursorShape) -> Cursor {
        match shape {
            CursorShape::Normal => self.normal,
            CursorShape::Move => self.move_,
            CursorShape::Resize(corner) => self.for_corner(corner),
        }
    }

    fn for_corner(&self, corner: Corner) -> Cursor {
        match corner {
            c if c == Corner::NW => self.resize_nw,
            c if c == Corner::NE => self.resize_ne,
            c if c == Corner::SW => self.resize_sw,
            c if c == Corner::SE => self.resize_se,
            c if c == Corner::N => self.resize_n,
            c if c == Corner::S => self.resize_s,
            c if c == Corner::E => self.resize_e,
            c if c == Corner::W => self.resize_w,
            _ => self.normal,
        }
    }
}
