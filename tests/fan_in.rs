use corrente::{RuntimeBuilder, Task, task};

#[test]
fn fan_in_ten_children() {
    let rt = RuntimeBuilder::new().worker_threads(4).build();

    let total = rt.block_on(async {
        let children: Vec<_> = (0..10)
            .map(|i| task::spawn(Task::new(async move { i })))
            .collect();

        let mut sum = 0;
        for child in children {
            sum += child.await;
        }
        sum
    });

    assert_eq!(total, 45);
}

#[test]
fn nested_fan_in() {
    let rt = RuntimeBuilder::new().worker_threads(4).build();

    let total = rt.block_on(async {
        let outer: Vec<_> = (0..4)
            .map(|i| {
                task::spawn(Task::new(async move {
                    let inner: Vec<_> = (0..4)
                        .map(|j| task::spawn(Task::new(async move { i * j })))
                        .collect();

                    let mut sum = 0;
                    for child in inner {
                        sum += child.await;
                    }
                    sum
                }))
            })
            .collect();

        let mut sum = 0;
        for child in outer {
            sum += child.await;
        }
        sum
    });

    // sum over i,j in 0..4 of i*j = (0+1+2+3)^2
    assert_eq!(total, 36);
}
