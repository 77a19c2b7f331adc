use std::io::{self, Write};

use game_loop::{game_loop, TimeTrait};
use termion::{clear, color};
use termion::cursor::{Goto, Hide, Show};
use termion::event::{Event, Key};
use termion::input::TermRead;
use termion::raw::{IntoRawMode, RawTerminal};
use termion::screen::{ToAlternateScreen, ToMainScreen};

use fow_base::base::{Matrix, Point};

use crate::glyph::{Color, Glyph};
use crate::world::{Command, World, WorldArgs};

mod glyph;
mod terrain;
mod world;

const DEFAULT_SIZE: Point = Point(60, 36);
const DEFAULT_UNITS: usize = 8;

// Draws a matrix of full-width glyphs, two columns per cell, centered in the
// terminal. Only rows that changed since the last frame are rewritten.
struct Screen {
    extent: Point,
    offset: Point,
    output: RawTerminal<io::Stdout>,
    next: Matrix<Glyph>,
    prev: Matrix<Glyph>,
    fg: Option<Color>,
}

impl Screen {
    fn new(size: Point) -> io::Result<Self> {
        let (x, y) = termion::terminal_size()?;
        let output = io::stdout().into_raw_mode()?;
        let extent = Point(x as i32, y as i32);
        let offset = Point((extent.0 - 2 * size.0) / 2 + 1, (extent.1 - size.1) / 2 + 1);
        let (next, prev) = (Matrix::new(size, Glyph::default()), Matrix::default());
        Ok(Self { extent, offset, output, next, prev, fg: None })
    }

    fn draw(&mut self) -> io::Result<()> {
        for y in 0..self.next.size.1 {
            let changed = |x: &i32| self.next.get(Point(*x, y)) != self.prev.get(Point(*x, y));
            let Some(start) = (0..self.next.size.0).find(changed) else { continue; };
            let Some(limit) = (0..self.next.size.0).rev().find(changed) else { continue; };

            let (mx, my) = (self.offset.0 + 2 * start, self.offset.1 + y);
            write!(self.output, "{}", Goto(mx as u16, my as u16))?;
            for x in start..=limit {
                let glyph = self.next.get(Point(x, y));
                self.set_foreground(glyph.fg())?;
                write!(self.output, "{}", glyph.wide())?;
            }
        }
        self.prev = self.next.clone();
        Ok(())
    }

    fn status(&mut self, message: &str) -> io::Result<()> {
        self.reset_foreground()?;
        let x = std::cmp::max(self.extent.0 - message.len() as i32, 1) as u16;
        write!(self.output, "{}{}{}", Goto(x, self.extent.1 as u16), clear::CurrentLine, message)
    }

    fn enter(&mut self) -> io::Result<()> {
        write!(self.output, "{}{}{}", ToAlternateScreen, Hide, clear::All)?;
        self.reset_foreground()?;
        self.output.flush()
    }

    fn exit(&mut self) -> io::Result<()> {
        self.reset_foreground()?;
        write!(self.output, "{}{}", ToMainScreen, Show)?;
        self.output.flush()?;
        self.output.suspend_raw_mode()
    }

    fn reset_foreground(&mut self) -> io::Result<()> {
        self.fg = None;
        write!(self.output, "{}", color::Fg(color::Reset))
    }

    fn set_foreground(&mut self, fg: Color) -> io::Result<()> {
        if self.fg == Some(fg) { return Ok(()); }
        self.fg = Some(fg);
        let (r, g, b) = fg.rgb();
        write!(self.output, "{}", color::Fg(color::Rgb(r, g, b)))
    }
}

// Seconds spent updating and drawing since the last status line.
#[derive(Default)]
struct Stats {
    update: f64,
    draw: f64,
    frames: usize,
}

impl Stats {
    fn summary(&self, elapsed: f64) -> String {
        format!("Update: {:.2}% / Draw: {:.2}% / FPS: {:.2}",
                100. * self.update / elapsed, 100. * self.draw / elapsed,
                self.frames as f64 / elapsed)
    }
}

fn command(event: Event) -> Option<Command> {
    let Event::Key(Key::Char(ch)) = event else { return None; };
    match ch {
        ' ' => Some(Command::AddUnit),
        'x' => Some(Command::RemoveUnit),
        '+' | '=' => Some(Command::RaiseThreshold),
        '-' => Some(Command::LowerThreshold),
        ']' => Some(Command::GrowSight),
        '[' => Some(Command::ShrinkSight),
        _ => None,
    }
}

struct Args {
    sim: Option<usize>,
    world: WorldArgs,
}

fn parse_args(args: &[String]) -> Option<Args> {
    let world = WorldArgs { size: DEFAULT_SIZE, units: DEFAULT_UNITS, seed: None };
    let mut result = Args { sim: None, world };
    let mut iter = args.iter().skip(1);
    while let Some(flag) = iter.next() {
        let value = iter.next()?;
        match flag.as_str() {
            "--sim" => result.sim = Some(value.parse().ok()?),
            "--units" => result.world.units = value.parse().ok()?,
            "--seed" => result.world.seed = Some(value.parse().ok()?),
            _ => return None,
        }
    }
    Some(result)
}

fn simulate(world: &mut World, steps: usize) {
    let start = game_loop::Time::now();
    for _ in 0..steps { world.update(); }
    let elapsed = game_loop::Time::now().sub(&start);

    let stats = world.stats();
    let per_step = if steps > 0 { 1000.0 * elapsed / steps as f64 } else { 0.0 };
    println!("Steps: {} / Time: {:.3}s / Per step: {:.3}ms", steps, elapsed, per_step);
    println!("Units: {} / Cached tiles: {} / Sweeps: {} / Visible tiles: {}",
             stats.registered_units, stats.cached_tiles, stats.sweeps, world.visible_tiles());
}

fn main() {
    env_logger::init();

    let args: Vec<_> = std::env::args().collect();
    let Some(args) = parse_args(&args) else {
        panic!("Usage: fow-term (--sim $STEPS)? (--units $COUNT)? (--seed $SEED)?");
    };
    let world = World::new(&args.world).unwrap();

    if let Some(steps) = args.sim {
        let mut world = world;
        simulate(&mut world, steps);
        return;
    }

    let mut output = Matrix::default();
    world.render(&mut output);

    let mut events = termion::async_stdin().events();
    let mut screen = Screen::new(output.size).unwrap();
    screen.enter().unwrap();
    screen.status("<calculating FPS...>").unwrap();

    let mut stats = Stats::default();
    let mut since = game_loop::Time::now();

    game_loop(world, 60, 0.01, |g| {
        let start = game_loop::Time::now();
        if let Some(Ok(e)) = events.next() {
            match e {
                Event::Key(Key::Ctrl('c')) | Event::Key(Key::Char('q')) => g.exit(),
                x => if let Some(x) = command(x) { g.game.apply(x); }
            }
        }
        g.game.update();
        let middle = game_loop::Time::now();
        stats.update += middle.sub(&start);

        // Units move on every update, so every frame draws.
        g.game.render(&mut screen.next);
        screen.draw().unwrap();
        let limit = game_loop::Time::now();
        stats.draw += limit.sub(&middle);
        stats.frames += 1;

        let elapsed = limit.sub(&since);
        if elapsed > 1.0 {
            let status = format!("{} / {}", g.game.status(), stats.summary(elapsed));
            screen.status(&status).unwrap();
            stats = Stats::default();
            since = limit;
        }
        screen.output.flush().unwrap();
    }, |_| {
        std::thread::sleep(std::time::Duration::from_micros(1000));
    });

    screen.exit().unwrap();
}

//////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn args(xs: &[&str]) -> Option<Args> {
        let xs: Vec<_> = std::iter::once("fow-term").chain(xs.iter().cloned())
            .map(String::from).collect();
        parse_args(&xs)
    }

    #[test]
    fn test_parse_args() {
        let result = args(&[]).unwrap();
        assert_eq!(result.sim, None);
        assert_eq!(result.world.units, DEFAULT_UNITS);
        assert_eq!(result.world.seed, None);

        let result = args(&["--units", "3", "--sim", "100", "--seed", "17"]).unwrap();
        assert_eq!(result.sim, Some(100));
        assert_eq!(result.world.units, 3);
        assert_eq!(result.world.seed, Some(17));

        assert!(args(&["--sim"]).is_none());
        assert!(args(&["--sim", "ten"]).is_none());
        assert!(args(&["--debug", "1"]).is_none());
    }

    #[test]
    fn test_commands() {
        assert_eq!(command(Event::Key(Key::Char(' '))), Some(Command::AddUnit));
        assert_eq!(command(Event::Key(Key::Char('['))), Some(Command::ShrinkSight));
        assert_eq!(command(Event::Key(Key::Char('z'))), None);
        assert_eq!(command(Event::Key(Key::Left)), None);
    }

    #[test]
    fn test_stats_summary() {
        let stats = Stats { update: 0.25, draw: 0.5, frames: 60 };
        assert_eq!(stats.summary(2.), "Update: 12.50% / Draw: 25.00% / FPS: 30.00");
    }

    #[test]
    fn test_simulate() {
        let mut world = World::new(&WorldArgs { size: Point(30, 20), units: 4, seed: Some(17) })
            .unwrap();
        simulate(&mut world, 20);
        assert_eq!(world.stats().registered_units, 4);
        assert!(world.stats().sweeps >= 4);
    }
}
