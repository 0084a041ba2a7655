use std::collections::VecDeque;
use std::convert::Infallible;
use std::iter::Fuse;

use crate::core::types::{Example, Token};

/// Sliding context window over a token stream
///
/// The window starts full of PAD. Every input token is emitted as a target
/// with the window that precedes it, then shifted in. Once the input runs dry,
/// PAD targets keep sliding in until the window holds nothing but PAD, so a
/// non-empty stream of length L yields exactly L + context_size examples and
/// an empty stream yields none.
///
/// The first error from the input is passed through and ends the stream.
pub struct Windows<I: Iterator> {
    tokens: Fuse<I>,
    window: VecDeque<Token>,
    pad: Token,
    /// PAD targets still owed once the input is exhausted
    trailing: usize,
    done: bool,
}

impl<I, E> Windows<I>
where
    I: Iterator<Item = Result<Token, E>>,
{
    pub fn new(tokens: I, context_size: usize) -> Self {
        let pad = Token::pad();
        Self {
            tokens: tokens.fuse(),
            window: std::iter::repeat_n(pad.clone(), context_size).collect(),
            pad,
            trailing: 0,
            done: false,
        }
    }

    fn slide(&mut self, target: Token) -> Example {
        let example = Example::new(self.window.iter().cloned().collect(), target.clone());
        if !self.window.is_empty() {
            self.window.pop_front();
            self.window.push_back(target);
        }
        example
    }
}

impl<I, E> Iterator for Windows<I>
where
    I: Iterator<Item = Result<Token, E>>,
{
    type Item = Result<Example, E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.tokens.next() {
            Some(Ok(token)) => {
                self.trailing = self.window.len();
                Some(Ok(self.slide(token)))
            }
            Some(Err(e)) => {
                self.done = true;
                Some(Err(e))
            }
            None if self.trailing > 0 => {
                self.trailing -= 1;
                let pad = self.pad.clone();
                Some(Ok(self.slide(pad)))
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

/// Windows over an infallible token sequence
pub fn windows<I>(tokens: I, context_size: usize) -> impl Iterator<Item = Example>
where
    I: IntoIterator<Item = Token>,
{
    Windows::new(
        tokens.into_iter().map(Ok::<Token, Infallible>),
        context_size,
    )
    .map(|example| match example {
        Ok(example) => example,
        Err(never) => match never {},
    })
}
