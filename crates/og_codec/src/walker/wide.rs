//! The iterative encoder behind
//! [`WideCircularSafe`](crate::ReuseStrategy::WideCircularSafe).
//!
//! Instead of recursing into members and elements, pending containers are
//! kept on an explicit stack. A frame never borrows into the graph: it
//! names its container by an anchor (the root, a shared allocation, or a
//! value created during the call) plus the path of steps from that anchor,
//! and the path is resolved again each time the frame advances. Shared
//! values start a new anchor with an empty path, so paths stay as short as
//! the value-semantics nesting between two shared values.
//!
//! The output is byte-identical to the recursive walker under
//! [`TreeWithReuse`](crate::ReuseStrategy::TreeWithReuse).

use alloc::rc::Rc;
use alloc::sync::Arc;
use alloc::vec::Vec;

use og_model::layout::{MemberKind, MemberLayout, MemberValue};
use og_model::{Graph, GraphRef, SharedDyn};

use crate::error::{CodecError, Result};
use crate::tracker::{EncodeTracker, Visit};
use crate::walker::encode::{EncodeContext, Sink, borrow_shared, element};
use crate::wire::Tag;

/// Where a frame's path starts.
#[derive(Clone)]
enum Anchor<'v> {
    Root(&'v dyn Graph),
    Shared(SharedDyn, &'static str),
    Owned(Rc<dyn Graph>),
}

/// One step from a value to a value it contains.
#[derive(Debug, Clone, Copy)]
enum Step {
    /// A stored field, `depth` base links up.
    Member { depth: usize, index: usize },
    Element(usize),
    /// The inside of `Some`.
    Some,
}

/// What the top frame visits next.
enum Next {
    Member(Arc<MemberLayout>, usize),
    Element(usize),
}

enum Cursor {
    Record { layout: Arc<MemberLayout>, next: usize },
    Array { len: usize, next: usize },
}

struct Frame<'v> {
    anchor: Anchor<'v>,
    path: Vec<Step>,
    cursor: Cursor,
}

fn resolve<'g>(mut node: &'g dyn Graph, path: &[Step]) -> Option<&'g dyn Graph> {
    for step in path {
        node = match (*step, node.graph_ref()) {
            (Step::Member { depth, index }, GraphRef::Record(record)) => {
                record.ancestor(depth)?.field_at(index)?
            }
            (Step::Element(index), GraphRef::Array(array)) => array.get(index)?,
            (Step::Some, GraphRef::Option(Some(inner))) => inner,
            _ => return None,
        };
    }
    Some(node)
}

/// Runs `f` on the value at `path` from `anchor`.
fn with_node<R>(
    anchor: &Anchor<'_>,
    path: &[Step],
    f: impl FnOnce(&dyn Graph) -> Result<R>,
) -> Result<R> {
    let lost = || CodecError::mismatch("reachable member", "missing value");
    match anchor {
        Anchor::Root(root) => f(resolve(*root, path).ok_or_else(lost)?),
        Anchor::Owned(value) => f(resolve(&**value, path).ok_or_else(lost)?),
        Anchor::Shared(shared, type_name) => {
            let guard = shared.try_borrow().map_err(|_| CodecError::Borrowed {
                type_name: (*type_name).into(),
            })?;
            let record: &dyn Graph = &*guard;
            f(resolve(record, path).ok_or_else(lost)?)
        }
    }
}

pub(crate) struct WideEncoder<'s, 'c, 'v> {
    sink: Sink<'s>,
    tracker: EncodeTracker,
    cx: EncodeContext<'c>,
    stack: Vec<Frame<'v>>,
    keep_alive: Vec<Rc<dyn Graph>>,
}

impl<'s, 'c, 'v> WideEncoder<'s, 'c, 'v> {
    pub fn new(sink: Sink<'s>, tracker: EncodeTracker, cx: EncodeContext<'c>) -> Self {
        Self {
            sink,
            tracker,
            cx,
            stack: Vec::new(),
            keep_alive: Vec::new(),
        }
    }

    pub fn encode_root(mut self, root: &'v dyn Graph) -> Result<()> {
        self.emit(root, &Anchor::Root(root), Vec::new())?;

        while let Some(frame) = self.stack.last_mut() {
            let next = match &mut frame.cursor {
                Cursor::Record { layout, next } => {
                    if *next == layout.len() {
                        self.stack.pop();
                        self.sink.out.tag(Tag::ObjectEnd);
                        continue;
                    }
                    *next += 1;
                    Next::Member(layout.clone(), *next - 1)
                }
                Cursor::Array { len, next } => {
                    if *next == *len {
                        self.stack.pop();
                        self.sink.out.tag(Tag::ArrayEnd);
                        continue;
                    }
                    *next += 1;
                    Next::Element(*next - 1)
                }
            };
            let anchor = frame.anchor.clone();
            let path = frame.path.clone();

            match next {
                Next::Element(index) => with_node(&anchor, &path, |node| {
                    let GraphRef::Array(array) = node.graph_ref() else {
                        return Err(CodecError::mismatch("array", node.graph_info().type_name()));
                    };
                    let item = element(array, index)?;
                    self.emit(item, &anchor, extend(&path, Step::Element(index)))
                })?,
                Next::Member(layout, index) => {
                    let member = layout.member(index);
                    with_node(&anchor, &path, |node| {
                        let Some(record) = node.as_record() else {
                            return Err(CodecError::mismatch("record", node.graph_info().type_name()));
                        };
                        match (member.get(record), member.kind()) {
                            (None, _) => Ok(()),
                            (Some(MemberValue::Borrowed(value)), MemberKind::Field(field)) => {
                                self.sink.field_name(member.wire_name())?;
                                let step = Step::Member {
                                    depth: member.depth(),
                                    index: field.index(),
                                };
                                self.emit(value, &anchor, extend(&path, step))
                            }
                            (Some(value), _) => {
                                self.sink.field_name(member.wire_name())?;
                                let value: Rc<dyn Graph> = match value {
                                    MemberValue::Computed(value) => Rc::from(value),
                                    MemberValue::Borrowed(_) => {
                                        return Err(CodecError::mismatch(
                                            "stored member",
                                            member.wire_name(),
                                        ));
                                    }
                                };
                                self.keep_alive.push(value.clone());
                                self.emit(&*value, &Anchor::Owned(value.clone()), Vec::new())
                            }
                        }
                    })?;
                }
            }
        }
        Ok(())
    }

    /// Writes `value` located at `path` from `anchor`, pushing a frame if it
    /// is a container.
    fn emit(&mut self, value: &dyn Graph, anchor: &Anchor<'v>, path: Vec<Step>) -> Result<()> {
        if let Some(replacement) = self.cx.transforms.encode(value) {
            let replacement: Rc<dyn Graph> = Rc::from(replacement);
            self.keep_alive.push(replacement.clone());
            return self.emit_shape(&*replacement, &Anchor::Owned(replacement.clone()), Vec::new());
        }
        self.emit_shape(value, anchor, path)
    }

    fn emit_shape(&mut self, value: &dyn Graph, anchor: &Anchor<'v>, path: Vec<Step>) -> Result<()> {
        match value.graph_ref() {
            GraphRef::Scalar(scalar) => {
                self.sink.out.scalar(scalar);
                Ok(())
            }
            GraphRef::Str(s) => self.sink.out.string(Some(s)),
            GraphRef::Option(None) => self.sink.none_of(value.graph_info()),
            GraphRef::Option(Some(inner)) => self.emit(inner, anchor, extend(&path, Step::Some)),
            GraphRef::Array(array) => {
                self.sink.array_start(array)?;
                self.stack.push(Frame {
                    anchor: anchor.clone(),
                    path,
                    cursor: Cursor::Array {
                        len: array.len(),
                        next: 0,
                    },
                });
                Ok(())
            }
            GraphRef::Record(record) => {
                let layout = self.cx.layouts.get(record.struct_info())?;
                self.sink.object_start(record.struct_info().type_name())?;
                self.stack.push(Frame {
                    anchor: anchor.clone(),
                    path,
                    cursor: Cursor::Record { layout, next: 0 },
                });
                Ok(())
            }
            GraphRef::Shared(shared) => {
                let identity = shared.identity();
                let (type_name, layout) = borrow_shared(shared, |record| {
                    let info = record.struct_info();
                    Ok((info.type_name(), self.cx.layouts.get(info)?))
                })?;
                self.sink.object_start(type_name)?;
                match self.tracker.enter(identity, type_name)? {
                    Visit::Seen(number) => {
                        self.sink.out.tag(Tag::ReferenceId);
                        self.sink.out.varint(number);
                        self.sink.out.tag(Tag::ObjectEnd);
                    }
                    Visit::New(number) => {
                        self.sink.out.tag(Tag::ReferenceId);
                        self.sink.out.varint(number);
                        self.stack.push(Frame {
                            anchor: Anchor::Shared(shared.erased(), type_name),
                            path: Vec::new(),
                            cursor: Cursor::Record { layout, next: 0 },
                        });
                    }
                    Visit::Untracked => {
                        self.stack.push(Frame {
                            anchor: Anchor::Shared(shared.erased(), type_name),
                            path: Vec::new(),
                            cursor: Cursor::Record { layout, next: 0 },
                        });
                    }
                }
                Ok(())
            }
        }
    }
}

fn extend(path: &[Step], step: Step) -> Vec<Step> {
    let mut out = Vec::with_capacity(path.len() + 1);
    out.extend_from_slice(path);
    out.push(step);
    out
}
