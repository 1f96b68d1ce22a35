//! An ordered, mutable queue of opcodes.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::vm::opcode::Opcode;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Program {
    opcodes: VecDeque<Opcode>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, opcode: Opcode) {
        self.opcodes.push_back(opcode);
    }

    pub fn prepend(&mut self, opcode: Opcode) {
        self.opcodes.push_front(opcode);
    }

    pub fn append_program(&mut self, other: Program) {
        self.opcodes.extend(other.opcodes);
    }

    pub fn prepend_program(&mut self, other: Program) {
        for opcode in other.opcodes.into_iter().rev() {
            self.opcodes.push_front(opcode);
        }
    }

    pub fn pop_front(&mut self) -> Option<Opcode> {
        self.opcodes.pop_front()
    }

    pub fn len(&self) -> usize {
        self.opcodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opcodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Opcode> {
        self.opcodes.iter()
    }
}

impl From<Vec<Opcode>> for Program {
    fn from(opcodes: Vec<Opcode>) -> Self {
        Self {
            opcodes: opcodes.into(),
        }
    }
}

impl IntoIterator for Program {
    type Item = Opcode;
    type IntoIter = std::collections::vec_deque::IntoIter<Opcode>;

    fn into_iter(self) -> Self::IntoIter {
        self.opcodes.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::local;

    fn checkout(name: &str) -> Opcode {
        Opcode::Checkout {
            branch: local(name),
        }
    }

    #[test]
    fn prepend_program_keeps_relative_order() {
        let mut program = Program::from(vec![checkout("c")]);
        program.prepend_program(Program::from(vec![checkout("a"), checkout("b")]));
        let names: Vec<Opcode> = program.into_iter().collect();
        assert_eq!(names, vec![checkout("a"), checkout("b"), checkout("c")]);
    }

    #[test]
    fn pop_front_consumes_in_order() {
        let mut program = Program::from(vec![checkout("a"), checkout("b")]);
        assert_eq!(program.pop_front(), Some(checkout("a")));
        assert_eq!(program.pop_front(), Some(checkout("b")));
        assert_eq!(program.pop_front(), None);
    }

    #[test]
    fn clone_leaves_the_original_untouched() {
        let mut program = Program::from(vec![checkout("a")]);
        let copy = program.clone();
        program.pop_front();
        assert!(program.is_empty());
        assert_eq!(copy.len(), 1);
    }
}
