//! Round-trips a small cyclic graph with reference tracking enabled.
//!
//! Run with: cargo run --example graph

use std::cell::RefCell;
use std::rc::Rc;

use fory::{Fory, ForyObject};

#[derive(ForyObject, Debug)]
struct Node {
    name: String,
    next: Option<Rc<RefCell<Node>>>,
}

fn main() {
    let _ = env_logger::try_init();
    let mut fory = Fory::default().track_ref(true);
    fory.register::<Node>(100).unwrap();

    let a = Rc::new(RefCell::new(Node {
        name: "a".to_string(),
        next: None,
    }));
    let b = Rc::new(RefCell::new(Node {
        name: "b".to_string(),
        next: Some(a.clone()),
    }));
    a.borrow_mut().next = Some(b);

    let bytes = fory.serialize(&a).unwrap();
    println!("cycle serialized into {} bytes", bytes.len());

    let out: Rc<RefCell<Node>> = fory.deserialize(&bytes).unwrap();
    let second = out.borrow().next.clone().unwrap();
    let third = second.borrow().next.clone().unwrap();
    println!(
        "{} -> {} -> {} (cycle closed: {})",
        out.borrow().name,
        second.borrow().name,
        third.borrow().name,
        Rc::ptr_eq(&out, &third)
    );

    // Break the cycles before dropping.
    a.borrow_mut().next = None;
    out.borrow_mut().next = None;
}
