use factgraph::fact::predicates;
use factgraph::transport::{ChannelIngest, ChannelQueries};
use factgraph::{EntityUpdate, Fact, GraphService, QueryKind, QueryLimits, QueryRequest};
use std::sync::Arc;

fn node(i: usize) -> EntityUpdate {
    let id = format!("n{i}");
    let mut facts = vec![Fact::new(&id, predicates::TITLE, format!("Node{i}"))];
    if i > 0 {
        facts.push(Fact::new(&id, predicates::IMPORTS, format!("n{}", i - 1)));
    }
    EntityUpdate::new(id, facts)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_queries_run_while_ingesting() {
    let svc = Arc::new(GraphService::new(QueryLimits::default()));

    let writers: Vec<_> = (0..4)
        .map(|w| {
            let svc = Arc::clone(&svc);
            tokio::spawn(async move {
                for i in (w..200).step_by(4) {
                    svc.ingest(node(i));
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|r| {
            let svc = Arc::clone(&svc);
            tokio::spawn(async move {
                for q in 0..100 {
                    let resp = svc.query(&QueryRequest::search(format!("r{r}-{q}"), "node"));
                    assert!(resp.success);
                    assert!(resp.entities.len() <= resp.total_count);
                    assert!(resp.entities.len() <= 100);
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.await.unwrap();
    }

    assert_eq!(svc.entity_count(), 200);
    let resp = svc.query(&QueryRequest::entity("last", QueryKind::DependedBy, "n0"));
    assert_eq!(resp.ids(), vec!["n1"]);
}

#[tokio::test]
async fn test_service_loops_over_channels() {
    let svc = Arc::new(GraphService::new(QueryLimits::new(10, 5)));
    let (ingest, source) = ChannelIngest::new(16);
    let (mut client, channel) = ChannelQueries::new(16);
    let handle = svc.start(source, channel);

    for i in 0..20 {
        ingest.send(&node(i)).await.unwrap();
    }
    drop(ingest);

    while svc.entity_count() < 20 {
        tokio::task::yield_now().await;
    }

    let resp = client
        .call(&QueryRequest::entity("deep", QueryKind::DependsOn, "n19").with_depth(50))
        .await
        .unwrap();
    // Depth is clamped to five hops
    assert_eq!(resp.ids(), vec!["n18", "n17", "n16", "n15", "n14"]);

    let resp = client
        .call(&QueryRequest::search("all", "node").with_max_results(50))
        .await
        .unwrap();
    assert_eq!(resp.total_count, 20);
    assert_eq!(resp.entities.len(), 10);

    let totals = handle.shutdown().await.unwrap();
    assert_eq!(totals.events, 20);
    assert_eq!(totals.queries, 2);
}

#[tokio::test]
async fn test_replay_file_through_line_ingest() {
    use factgraph::transport::LineIngest;
    use std::io::Write;
    use tokio::sync::watch;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    for i in 0..3 {
        writeln!(file, "{}", serde_json::to_string(&node(i)).unwrap()).unwrap();
    }
    writeln!(file).unwrap();
    writeln!(file, "{{\"facts\": []}}").unwrap();

    let svc = GraphService::new(QueryLimits::default());
    let reader = tokio::io::BufReader::new(tokio::fs::File::open(file.path()).await.unwrap());
    let (_stop_tx, stop_rx) = watch::channel(false);

    let received = svc.run_ingestion(LineIngest::new(reader), stop_rx).await;
    assert_eq!(received, 4);

    let stats = svc.stats();
    assert_eq!(stats.graph.entities, 3);
    assert_eq!(stats.events_applied, 3);
    assert_eq!(stats.events_dropped, 1);
}
