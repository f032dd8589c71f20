use std::error::Error;

use env_logger::Env;
use learngl_app::{App, AppConfig};
use winit::event_loop::EventLoop;

fn main() -> Result<(), Box<dyn Error>> {
  env_logger::Builder::from_env(Env::default().default_filter_or("info"))
    .format_timestamp_millis()
    .init();

  let event_loop = EventLoop::new()?;
  let mut app = App::new(AppConfig::from_env());
  event_loop.run_app(&mut app)?;
  Ok(app.finish()?)
}
