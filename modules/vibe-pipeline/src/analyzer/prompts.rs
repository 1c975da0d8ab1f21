use std::collections::HashMap;

use super::AnalysisKind;
use crate::template;

const PREAMBLE: &str = "You analyze scraped social media content for creators and curators. \
Respond with a single JSON object and nothing else.";

const USER_TEMPLATE: &str = "Analysis: {{kind}}\n\nInput (JSON):\n{{payload}}";

/// System prompt for one analysis kind. Each prompt names the keys the
/// report aggregator reads back out of the reply.
pub(crate) fn system_prompt(kind: AnalysisKind) -> String {
    let body = match kind {
        AnalysisKind::Sentiment => {
            "Score the overall sentiment of the posts, taking slang, emojis and platform \
             context into account. Required keys:\n\
             - overallSentiment: number in [-1, 1]\n\
             - sentimentDistribution: {positive, neutral, negative} as fractions\n\
             - emotions: {primary: [string], secondary: [string]}\n\
             - keyThemes: [string]\n\
             - recommendations: {content_strategy: [string], emotional_optimization: [string], \
             engagement_tactics: [string]}"
        }
        AnalysisKind::Categorization => {
            "Categorize the content. Required keys:\n\
             - primaryCategory: string (Travel, Food, Fashion, Lifestyle, ...)\n\
             - secondaryCategories: [string]\n\
             - suggestedHashtags: [string]\n\
             - targetAudience: string\n\
             - qualityScore: number in [1, 10]\n\
             - viralPotential: number in [1, 10]\n\
             - reasoning: string, one paragraph"
        }
        AnalysisKind::Video => {
            "Assess the short-form video posts using their engagement numbers and hashtags. \
             Required keys:\n\
             - contentAnalysis: {themes: [string], style: string}\n\
             - engagementAnalysis: {engagement_rate: number, peakEngagementFactors: [string]}\n\
             - hashtagAnalysis: {trending_hashtags: [string], niche_hashtags: [string]}\n\
             - viralPotential: {score: number in [0, 100]}\n\
             - recommendations: {content_optimization: [string], hashtag_strategy: [string], \
             engagement_tactics: [string]}"
        }
        AnalysisKind::Document => {
            "Process the long-form text. Required keys:\n\
             - keywordAnalysis: {primary_keywords: [string], secondary_keywords: [string]}\n\
             - topicModeling: {main_topics: [string]}\n\
             - contentSummary: {brief_summary: string, key_points: [string]}\n\
             - relevanceScoring: {curation_score: number in [0, 100]}\n\
             - recommendations: {content_improvements: [string], seo_optimizations: [string]}"
        }
        AnalysisKind::MultiModal => {
            "Combine the text, media and prior analyses into one cross-modal assessment. \
             Required keys:\n\
             - crossModalAnalysis: {coherence_score: number in [0, 10]}\n\
             - engagementPrediction: {multi_modal_score: number in [0, 100]}\n\
             - contentQuality: {production_quality: number in [0, 10]}\n\
             - optimizationRecommendations: {text_optimization: [string], \
             visual_optimization: [string], cross_modal_enhancement: [string]}"
        }
        AnalysisKind::Trends => {
            "Judge trend alignment and viral potential from the content and prior analyses. \
             Required keys:\n\
             - trendAlignment: {current_trends: [string], alignment_score: number}\n\
             - viralPotential: {overall_score: number in [0, 100], growth_prediction: string}\n\
             - engagementForecast: {engagement_trajectory: string}\n\
             - recommendations: {trend_optimization: [string], viral_enhancement: [string], \
             timing_strategy: [string]}"
        }
        AnalysisKind::Vibe => {
            "Describe the overall vibe of the content for a curator deciding whether to \
             feature it. Required keys:\n\
             - vibe: string, a short label\n\
             - description: string\n\
             - keywords: [string]\n\
             - audienceFit: string"
        }
    };
    format!("{PREAMBLE}\n\n{body}")
}

pub(crate) fn user_prompt(kind: AnalysisKind, payload: &str) -> String {
    template::render(
        USER_TEMPLATE,
        &HashMap::from([("kind", kind.as_str()), ("payload", payload)]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompts_name_the_keys_the_report_reads() {
        let cases = [
            (AnalysisKind::Sentiment, "overallSentiment"),
            (AnalysisKind::Sentiment, "engagement_tactics"),
            (AnalysisKind::Categorization, "reasoning"),
            (AnalysisKind::Video, "content_optimization"),
            (AnalysisKind::Document, "curation_score"),
            (AnalysisKind::MultiModal, "production_quality"),
            (AnalysisKind::MultiModal, "multi_modal_score"),
            (AnalysisKind::Trends, "overall_score"),
            (AnalysisKind::Trends, "timing_strategy"),
        ];
        for (kind, key) in cases {
            assert!(system_prompt(kind).contains(key), "{kind} prompt lacks {key}");
        }
    }

    #[test]
    fn user_prompt_carries_kind_and_payload() {
        let prompt = user_prompt(AnalysisKind::Video, r#"{"posts":[]}"#);
        assert!(prompt.starts_with("Analysis: video"));
        assert!(prompt.ends_with(r#"{"posts":[]}"#));
        assert!(template::placeholders(&prompt).is_empty());
    }
}
