//! Default splicer: positional insertion into a block's statement list

use std::sync::Arc;

use super::super::domain::Fragment;
use super::super::ports::{Coordinate, TemplateSplicer};
use crate::errors::{Result, SecfixError};
use crate::shared::models::{build, Block};

#[derive(Debug, Clone, Copy, Default)]
pub struct BlockSplicer;

impl BlockSplicer {
    pub fn new() -> Self {
        Self
    }
}

impl TemplateSplicer for BlockSplicer {
    fn splice(&self, block: &Arc<Block>, fragment: Fragment, coordinate: &Coordinate) -> Result<Arc<Block>> {
        let index = block.position_of(coordinate.anchor()).ok_or_else(|| {
            SecfixError::splice(format!(
                "anchor is not a statement of the target block ({} statements)",
                block.statements.len()
            ))
        })?;

        let inserted = match fragment {
            Fragment::Statements(stmts) => stmts,
            // Only a replaced expression statement can take an expression
            Fragment::Expression(expr) => match coordinate {
                Coordinate::Replace(anchor) if anchor.as_expression().is_some() => vec![build::expr_stmt(expr)],
                _ => {
                    return Err(SecfixError::splice(
                        "expression fragment can only replace an expression statement",
                    ))
                }
            },
        };

        let mut statements = block.statements.clone();
        match coordinate {
            Coordinate::Before(_) => {
                statements.splice(index..index, inserted);
            }
            Coordinate::After(_) => {
                statements.splice(index + 1..index + 1, inserted);
            }
            Coordinate::Replace(_) => {
                statements.splice(index..=index, inserted);
            }
        }
        Ok(Arc::new(block.with_statements(statements)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{JavaType, Statement};

    fn stmt(name: &str) -> Arc<Statement> {
        build::expr_stmt(build::ident(name, JavaType::string()))
    }

    fn names(block: &Block) -> Vec<String> {
        block
            .statements
            .iter()
            .filter_map(|s| s.as_expression())
            .filter_map(|e| e.local_name().map(str::to_string))
            .collect()
    }

    #[test]
    fn test_coordinates() {
        let (a, b) = (stmt("a"), stmt("b"));
        let block = build::block(vec![a.clone(), b.clone()]);
        let splicer = BlockSplicer::new();

        let before = splicer
            .splice(&block, Fragment::Statements(vec![stmt("x")]), &Coordinate::Before(b.clone()))
            .unwrap();
        assert_eq!(names(&before), ["a", "x", "b"]);

        let after = splicer
            .splice(&block, Fragment::Statements(vec![stmt("x"), stmt("y")]), &Coordinate::After(a.clone()))
            .unwrap();
        assert_eq!(names(&after), ["a", "x", "y", "b"]);

        let removed = splicer
            .splice(&block, Fragment::Statements(vec![]), &Coordinate::Replace(a))
            .unwrap();
        assert_eq!(names(&removed), ["b"]);
        assert!(Arc::ptr_eq(&removed.statements[0], &b));
    }

    #[test]
    fn test_foreign_anchor_is_an_error() {
        let block = build::block(vec![stmt("a")]);
        let err = BlockSplicer
            .splice(&block, Fragment::Statements(vec![]), &Coordinate::After(stmt("a")))
            .unwrap_err();
        assert!(matches!(err, SecfixError::Splice(_)));
    }

    #[test]
    fn test_expression_fragment_replaces_expression_statement() {
        let a = stmt("a");
        let block = build::block(vec![a.clone()]);
        let out = BlockSplicer
            .splice(&block, Fragment::Expression(build::ident("z", JavaType::string())), &Coordinate::Replace(a.clone()))
            .unwrap();
        assert_eq!(names(&out), ["z"]);
        assert!(BlockSplicer
            .splice(&block, Fragment::Expression(build::null_lit()), &Coordinate::After(a))
            .is_err());
    }
}
