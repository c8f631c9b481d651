//! End-to-end checks on the thread-affinity discipline
//!
//! Several tasks interleave cooperatively on one runtime thread; every
//! native-style operation must observe the same thread id, and awaiting one
//! operation must not block the others from making progress.

use pdfium_host::affinity::{run_affine, ThreadAffinity};
use std::thread;
use tokio::task::LocalSet;

#[test]
fn interleaved_tasks_share_one_execution_thread() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    let local = LocalSet::new();
    let observed = runtime.block_on(local.run_until(async {
        let affinity = ThreadAffinity::capture();

        let mut tasks = Vec::new();
        for _ in 0..16 {
            tasks.push(tokio::task::spawn_local(async move {
                run_affine(affinity, || thread::current().id()).await
            }));
        }

        let mut ids = Vec::new();
        for task in tasks {
            ids.push(task.await.unwrap());
        }
        ids
    }));

    let first = observed[0];
    assert!(observed.iter().all(|id| *id == first));
}

#[test]
fn awaiting_callers_stay_cooperative() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    runtime.block_on(async {
        let affinity = ThreadAffinity::capture();
        let local = LocalSet::new();

        local
            .run_until(async {
                let mut order = Vec::new();

                // Each run_affine yields once before executing, so two tasks
                // started back to back interleave instead of running to
                // completion serially at spawn time.
                let a = tokio::task::spawn_local({
                    async move { run_affine(affinity, || "a").await }
                });
                let b = tokio::task::spawn_local({
                    async move { run_affine(affinity, || "b").await }
                });

                order.push(a.await.unwrap());
                order.push(b.await.unwrap());
                assert_eq!(order, vec!["a", "b"]);
            })
            .await;
    });
}
