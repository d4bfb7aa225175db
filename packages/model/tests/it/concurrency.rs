use crate::helpers::{append, group_model, CHILDREN, LEAF};
use arbor_model::{roles, Item, ProgressHandler, QueueError, ThreadSafeQueue, Variant};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const WORKERS: usize = 4;
const PER_WORKER: usize = 25;

/// Items are built off-thread and attached on the model's thread
#[test]
fn workers_feed_detached_items() {
    let queue = Arc::new(ThreadSafeQueue::bounded(8));
    let progress = Arc::new(ProgressHandler::new());
    progress.set_max_ticks_count(WORKERS * PER_WORKER);

    let handles: Vec<_> = (0..WORKERS)
        .map(|worker| {
            let queue = Arc::clone(&queue);
            let progress = Arc::clone(&progress);
            thread::spawn(move || {
                for n in 0..PER_WORKER {
                    let mut item = Item::new(LEAF);
                    let value = (worker * PER_WORKER + n) as i64;
                    item.set_data(Variant::Int(value), roles::DATA).unwrap();
                    queue.push(item).unwrap();
                    progress.tick(1);
                }
            })
        })
        .collect();

    let mut model = group_model();
    let root = model.root_item();
    model.begin_macro("Import").unwrap();
    for _ in 0..WORKERS * PER_WORKER {
        let item = queue.wait_and_pop().unwrap();
        model.insert_item(item, root, &append()).unwrap();
    }
    model.end_macro().unwrap();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(progress.percentage(), 100);
    assert_eq!(model.items(root, CHILDREN).unwrap().len(), WORKERS * PER_WORKER);
    let mut values: Vec<i64> = model
        .items(root, CHILDREN)
        .unwrap()
        .iter()
        .map(|key| model.data(*key, roles::DATA).unwrap().as_int().unwrap())
        .collect();
    values.sort_unstable();
    assert_eq!(values, (0..(WORKERS * PER_WORKER) as i64).collect::<Vec<_>>());

    // the whole import is one step
    model.undo().unwrap();
    assert!(model.items(root, CHILDREN).unwrap().is_empty());
}

#[test]
fn interrupt_stops_worker_early() {
    let progress = Arc::new(ProgressHandler::with_callback(|percentage| percentage >= 50));
    progress.set_max_ticks_count(100);
    let queue: Arc<ThreadSafeQueue<usize>> = Arc::new(ThreadSafeQueue::unbounded());

    let worker = {
        let progress = Arc::clone(&progress);
        let queue = Arc::clone(&queue);
        thread::spawn(move || {
            let mut done = 0;
            for n in 0..100 {
                queue.push(n).unwrap();
                done += 1;
                if progress.tick(1) {
                    break;
                }
            }
            done
        })
    };

    let done = worker.join().unwrap();
    assert_eq!(done, 50);
    assert!(progress.is_interrupted());
    assert_eq!(queue.len(), 50);
}

#[test]
fn stop_wakes_waiting_consumer() {
    let queue: Arc<ThreadSafeQueue<Item>> = Arc::new(ThreadSafeQueue::unbounded());
    let consumer = {
        let queue = Arc::clone(&queue);
        thread::spawn(move || queue.wait_and_pop())
    };

    thread::sleep(Duration::from_millis(20));
    queue.stop();
    assert_eq!(consumer.join().unwrap().unwrap_err(), QueueError::Stopped);
    assert!(queue.push(Item::new(LEAF)).is_err());
}
