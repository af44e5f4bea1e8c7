mod support;

use anyhow::anyhow;
use factcheck_graphflow::models::Verdict;
use factcheck_graphflow::{FactCheckError, FactChecker, PipelineSettings};
use serde_json::json;
use std::sync::Arc;
use support::*;

const G20: &str = "India to host G20 summit in 2025";

#[tokio::test]
async fn debunked_claim_is_fake_with_correction() {
    let search = Arc::new(
        FakeSearch::default()
            .with(
                &format!("{G20} fact check"),
                vec![hit(
                    "Fact check: India is not hosting the 2025 G20",
                    "https://factcheck.example/g20-2025",
                    "South Africa holds the 2025 G20 presidency.",
                )],
            )
            .with(
                G20,
                vec![hit("SHOCKING G20 news", "https://viral.example/g20", "You won't believe who hosts!")],
            ),
    );
    let generator = Arc::new(FakeGenerator::new(|instructions, _| {
        assert!(is_triage(instructions), "no sub-claims, so only triage should prompt");
        Ok(fenced(json!({
            "direct_verification_status": "debunked",
            "correction": "South Africa will host, not India",
            "direct_sources": [{"title": "Fact check: India is not hosting the 2025 G20", "url": "https://factcheck.example/g20-2025"}],
            "inferred_tone": "positive",
            "inferred_intensity": "high",
            "sensationalism_level": "high",
            "bias_detected": false,
            "core_claims": []
        })))
    }));

    let report = checker(search.clone(), generator.clone()).run(G20).await.unwrap();

    assert_eq!(report.verdict, Verdict::Fake);
    assert!(report.recommendation.starts_with("AVOID SHARING THIS CONTENT."));
    assert!(report.recommendation.contains("South Africa will host, not India"));
    assert!(report.reasoning.contains("is false"));
    assert!(report.reasoning.contains("South Africa will host, not India"));
    assert_eq!(report.total_sources, 1);
    assert_eq!(generator.call_count(), 1);

    let queries = search.seen_queries();
    for suffix in ["fact check", "debunked", "true or false"] {
        assert!(queries.contains(&format!("{G20} {suffix}")), "missing query with suffix {suffix}");
    }
}

#[tokio::test]
async fn verified_claim_without_sub_claims_cites_direct_sources_only() {
    let claim = "The Eiffel Tower is in Paris";
    let search = Arc::new(FakeSearch::default().with(
        &format!("{claim} fact check"),
        vec![
            hit("Eiffel Tower - Britannica", "https://britannica.example/eiffel", "The tower stands in Paris."),
            hit("Visit the Eiffel Tower", "https://tourism.example/eiffel", "Located on the Champ de Mars, Paris."),
            hit("Unrelated", "https://other.example/x", ""),
        ],
    ));
    let generator = Arc::new(FakeGenerator::new(|_, _| {
        Ok(fenced(json!({
            "direct_verification_status": "verified",
            "correction": "N/A",
            "direct_sources": [
                {"title": "Eiffel Tower - Britannica", "url": "https://britannica.example/eiffel"},
                {"title": "Visit the Eiffel Tower", "url": "https://tourism.example/eiffel"}
            ],
            "inferred_tone": "neutral",
            "inferred_intensity": "low",
            "sensationalism_level": "low",
            "bias_detected": false,
            "core_claims": []
        })))
    }));

    let run = checker(search, generator.clone()).check(claim).await.unwrap();

    assert_eq!(run.report.verdict, Verdict::Verified);
    assert_eq!(run.report.recommendation, "This information appears reliable and can be shared.");
    assert_eq!(run.report.total_sources, 2);
    assert_eq!(run.report.citations.len(), 2);
    assert_eq!(generator.call_count(), 1);
    for task in ["triage", "claim_verification", "verdict_synthesis"] {
        assert!(run.task_times.contains_key(task), "no timing for {task}");
    }
}

#[tokio::test]
async fn no_evidence_anywhere_is_uncertain() {
    let search = Arc::new(FakeSearch::default());
    let generator = Arc::new(FakeGenerator::new(|_, _| Err(anyhow!("should not be called"))));

    let report = checker(search, generator.clone())
        .run("Aliens built a new airport in Ohio")
        .await
        .unwrap();

    assert_eq!(report.verdict, Verdict::Uncertain);
    assert!(report.citations.is_empty());
    assert_eq!(report.total_sources, 0);
    assert!(report.recommendation.starts_with("Proceed with caution."));
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn failing_search_provider_degrades_to_uncertain() {
    let generator = Arc::new(FakeGenerator::new(|_, _| Err(anyhow!("should not be called"))));
    let checker = FactChecker::new(Arc::new(BrokenSearch), generator, PipelineSettings::default());

    let report = checker.run("Coffee cures insomnia").await.unwrap();
    assert_eq!(report.verdict, Verdict::Uncertain);
    assert_eq!(report.total_sources, 0);
}

#[tokio::test]
async fn sub_claims_feed_reasoning_and_citations_but_not_the_verdict() {
    let claim = "City X opened a new metro line and doubled its budget";
    let line = "City X opened a new metro line";
    let budget = "City X doubled its transport budget";

    let search = Arc::new(
        FakeSearch::default()
            .with(
                &format!("{claim} fact check"),
                vec![
                    hit("Metro opens", "https://news-a.example/metro", "The line opened Monday."),
                    hit("City confirms", "https://city.example/press", "Official release."),
                ],
            )
            .with(
                &format!("is {line} true"),
                vec![
                    hit("Metro opens (dup title)", "https://news-a.example/metro", ""),
                    hit("Transit weekly", "https://transit.example/line", "First trains ran Monday."),
                ],
            )
            .with(
                &format!("{budget} fact check"),
                vec![hit("Budget story", "https://budget.example/x", "Budget up 10%.")],
            ),
    );

    let generator = Arc::new(FakeGenerator::new(move |instructions, context| {
        if is_triage(instructions) {
            return Ok(fenced(json!({
                "direct_verification_status": "verified",
                "direct_sources": [
                    {"title": "Metro opens", "url": "https://news-a.example/metro"},
                    {"title": "City confirms", "url": "https://city.example/press"}
                ],
                "sensationalism_level": "high",
                "bias_detected": false,
                "core_claims": [line, budget]
            })));
        }
        match context_claim(context).as_str() {
            c if c == line => Ok(fenced(json!({
                "status": "verified",
                "reasoning": "Two outlets report the opening.",
                "sources": [
                    {"title": "Metro opens (dup title)", "url": "https://news-a.example/metro"},
                    {"title": "Transit weekly", "url": "https://transit.example/line"}
                ]
            }))),
            _ => Ok("I could not find anything conclusive.".to_string()),
        }
    }));

    let report = checker(search, generator.clone()).run(claim).await.unwrap();

    assert_eq!(report.verdict, Verdict::LikelyVerified);
    assert!(report.recommendation.contains("Share with mild caution."));
    assert!(report.reasoning.contains(&format!("\"{line}\": verified.")));
    assert!(report.reasoning.contains(&format!("\"{budget}\": unverifiable.")));
    assert!(report.reasoning.contains("1 verified, 0 debunked, 1 unverifiable"));

    let urls: Vec<&str> = report.citations.iter().map(|c| c.url.as_str()).collect();
    assert_eq!(
        urls,
        vec!["https://news-a.example/metro", "https://city.example/press", "https://transit.example/line"]
    );
    assert_eq!(report.citations[0].title, "Metro opens");
    assert_eq!(report.total_sources, report.citations.len());
    assert_eq!(generator.call_count(), 3);
}

#[tokio::test]
async fn unstructured_triage_reply_is_uncertain() {
    let claim = "Vitamin C prevents all colds";
    let search = Arc::new(FakeSearch::default().with(
        &format!("{claim} debunked"),
        vec![hit("Colds and vitamin C", "https://health.example/c", "Evidence is mixed.")],
    ));
    let generator = Arc::new(FakeGenerator::new(|_, _| Ok("I think this is probably false.".to_string())));

    let report = checker(search, generator).run(claim).await.unwrap();
    assert_eq!(report.verdict, Verdict::Uncertain);
    assert!(report.citations.is_empty());
}

#[tokio::test]
async fn triage_generation_failure_is_surfaced() {
    let claim = "The Great Wall is visible from space";
    let search = Arc::new(FakeSearch::default().with(
        &format!("{claim} fact check"),
        vec![hit("Myth", "https://myths.example/wall", "Not visible to the naked eye.")],
    ));
    let generator = Arc::new(FakeGenerator::new(|_, _| Err(anyhow!("model offline"))));

    let err = checker(search, generator).run(claim).await.unwrap_err();
    assert!(
        matches!(err, FactCheckError::Generation { stage: "triage", .. }),
        "unexpected error: {err}"
    );
    assert!(err.to_string().contains("model offline"), "error lost its cause: {err}");
}

#[tokio::test]
async fn claim_verification_generation_failure_fails_the_run() {
    let claim = "Town Y banned cars and planted a forest";
    let cars = "Town Y banned cars";
    let forest = "Town Y planted a forest";
    let search = Arc::new(
        FakeSearch::default()
            .with(
                &format!("{claim} fact check"),
                vec![hit("Town Y news", "https://local.example/y", "Council votes on traffic.")],
            )
            .with(&format!("is {cars} true"), vec![hit("Car ban", "https://local.example/cars", "")])
            .with(&format!("is {forest} true"), vec![hit("Forest", "https://local.example/forest", "")]),
    );
    let generator = Arc::new(FakeGenerator::new(move |instructions, context| {
        if is_triage(instructions) {
            return Ok(fenced(json!({
                "direct_verification_status": "unverifiable",
                "core_claims": [cars, forest]
            })));
        }
        if context_claim(context) == cars {
            Err(anyhow!("rate limited"))
        } else {
            Ok(fenced(json!({"status": "unverifiable", "reasoning": "Single local report."})))
        }
    }));

    let err = checker(search, generator.clone()).run(claim).await.unwrap_err();
    assert!(
        matches!(err, FactCheckError::Generation { stage: "claim_verification", .. }),
        "unexpected error: {err}"
    );
    assert!(err.to_string().contains("rate limited"), "error lost its cause: {err}");
    assert!(err.to_string().contains(cars), "error does not name the claim: {err}");
    // Triage plus both claims: the sibling claim still ran to completion.
    assert_eq!(generator.call_count(), 3);
}

#[tokio::test]
async fn empty_claim_is_rejected_before_any_stage() {
    let search = Arc::new(FakeSearch::default());
    let generator = Arc::new(FakeGenerator::new(|_, _| Err(anyhow!("unused"))));

    let err = checker(search.clone(), generator).run("   ").await.unwrap_err();
    assert!(matches!(err, FactCheckError::EmptyClaim));
    assert!(search.seen_queries().is_empty());
}

#[tokio::test]
async fn runs_do_not_share_state() {
    let search = Arc::new(FakeSearch::default());
    let generator = Arc::new(FakeGenerator::new(|_, _| Err(anyhow!("unused"))));
    let checker = checker(search, generator);

    let (a, b) = tokio::join!(checker.check("claim one"), checker.check("claim two"));
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_ne!(a.session_id, b.session_id);
    assert_eq!(a.claim, "claim one");
    assert_eq!(b.claim, "claim two");
}
