mod bullet_points;

pub use bullet_points::{BufferLineWriter, BulletPointPrinter, LineWriter, StdoutLineWriter};
