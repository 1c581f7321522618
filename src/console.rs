//! Line-oriented command console over a skip list.
//!
//! One command per line, case sensitive:
//! `INSERT <k> <v>`, `DELETE <k>`, `UPDATE <k> <v>`, `SEARCH <k>`,
//! `DISPLAY`, `SIZE`, `CLEAR`, `EXIT`. Blank lines are ignored; unknown
//! commands report an error and the session continues.

use crate::skiplist::SkipList;
use std::fmt::Display;
use std::io::{BufRead, Write};
use std::str::FromStr;

pub struct Console<'a, K, V> {
    list: &'a SkipList<K, V>,
}

impl<'a, K, V> Console<'a, K, V>
where
    K: Ord + Default + Display + FromStr,
    V: Default + Clone + Display + FromStr,
{
    pub fn new(list: &'a SkipList<K, V>) -> Self {
        Self { list }
    }

    /// Run the command loop until `EXIT` or end of input.
    pub fn run(&self, input: &mut impl BufRead, out: &mut impl Write) -> std::io::Result<()> {
        writeln!(out, "SkipList Console Interface")?;
        writeln!(
            out,
            "Available commands: INSERT <key> <value>, DELETE <key>, \
             UPDATE <key> <value>, SEARCH <key>, DISPLAY, SIZE, CLEAR, EXIT"
        )?;

        let mut line = String::new();
        loop {
            write!(out, "> ")?;
            out.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                // End of input behaves like EXIT.
                break;
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let mut words = trimmed.split_whitespace();
            let command = words.next().unwrap_or_default();
            match command {
                "INSERT" => match (parse_next::<K>(&mut words), parse_next::<V>(&mut words)) {
                    (Some(key), Some(value)) => {
                        if self.list.insert(key, value).is_inserted() {
                            writeln!(out, "Element inserted.")?;
                        } else {
                            writeln!(out, "Key already exists.")?;
                        }
                    }
                    _ => writeln!(out, "Usage: INSERT <key> <value>")?,
                },
                "DELETE" => match parse_next::<K>(&mut words) {
                    Some(key) => {
                        self.list.delete(&key);
                        writeln!(out, "Element deleted (if it existed).")?;
                    }
                    None => writeln!(out, "Usage: DELETE <key>")?,
                },
                "UPDATE" => match (parse_next::<K>(&mut words), parse_next::<V>(&mut words)) {
                    (Some(key), Some(new_value)) => {
                        match self
                            .list
                            .update_and_return_old(&key, new_value.clone())
                        {
                            Some(old_value) => writeln!(
                                out,
                                "Element with key \"{}\" has been updated from \"{}\" to \"{}\".",
                                key, old_value, new_value
                            )?,
                            None => {
                                writeln!(out, "Element with key \"{}\" not found.", key)?
                            }
                        }
                    }
                    _ => writeln!(out, "Usage: UPDATE <key> <value>")?,
                },
                "SEARCH" => match parse_next::<K>(&mut words) {
                    Some(key) => match self.list.search(&key) {
                        Some(value) => {
                            writeln!(out, "Element found. Key: {}, Value: {}.", key, value)?
                        }
                        None => writeln!(out, "Element not found.")?,
                    },
                    None => writeln!(out, "Usage: SEARCH <key>")?,
                },
                "DISPLAY" => self.list.display(out)?,
                "SIZE" => writeln!(out, "Size: {}", self.list.size())?,
                "CLEAR" => {
                    self.list.clear();
                    writeln!(out, "List cleared.")?;
                }
                "EXIT" => {
                    writeln!(out, "Exiting...")?;
                    break;
                }
                _ => writeln!(out, "Unknown command.")?,
            }
        }
        Ok(())
    }
}

fn parse_next<T: FromStr>(words: &mut std::str::SplitWhitespace<'_>) -> Option<T> {
    words.next()?.parse().ok()
}
