//! Suggestion engine
//!
//! Suggestions come from a declarative rule table evaluated in order. Every
//! matching rule fires; the result is stably sorted by priority and capped.
//! When nothing fires and most habits are already healthy, a single
//! reinforcement suggestion is returned instead.

use crate::config::SuggestionConfig;
use crate::types::{
    DailyMetrics, MoodLevel, Priority, RiskLevel, ScoreBreakdown, Suggestion, SuggestionCategory,
};

/// Inputs visible to suggestion rules
struct Context<'a> {
    metrics: &'a DailyMetrics,
    score: Option<&'a ScoreBreakdown>,
    risk: Option<RiskLevel>,
    config: &'a SuggestionConfig,
}

impl Context<'_> {
    /// Count of {short sleep, long study, few breaks, heavy screen use}
    fn concerning_factors(&self) -> usize {
        let m = self.metrics;
        let c = self.config;
        [
            m.sleep_hours < c.sleep_low_below,
            m.study_hours > c.study_high_above,
            m.break_time < c.break_low_below,
            m.screen_time > c.screen_high_above,
        ]
        .into_iter()
        .filter(|hit| *hit)
        .count()
    }

    fn healthy_factors(&self) -> usize {
        let m = self.metrics;
        let c = self.config;
        [
            (c.healthy_sleep_min..=c.healthy_sleep_max).contains(&m.sleep_hours),
            (c.healthy_study_min..=c.healthy_study_max).contains(&m.study_hours),
            (c.healthy_break_min..=c.healthy_break_max).contains(&m.break_time),
            m.screen_time <= c.healthy_screen_max,
        ]
        .into_iter()
        .filter(|hit| *hit)
        .count()
    }
}

/// One entry of the rule table
struct SuggestionRule {
    id: &'static str,
    title: &'static str,
    priority: Priority,
    category: SuggestionCategory,
    icon: &'static str,
    applies: fn(&Context) -> bool,
    describe: fn(&Context) -> String,
}

impl SuggestionRule {
    fn build(&self, cx: &Context) -> Suggestion {
        Suggestion {
            title: self.title.to_string(),
            description: (self.describe)(cx),
            priority: self.priority,
            category: self.category,
            icon: self.icon.to_string(),
            rule: self.id.to_string(),
        }
    }
}

const RULES: &[SuggestionRule] = &[
    SuggestionRule {
        id: "sleep_critical",
        title: "Increase Sleep Hours",
        priority: Priority::High,
        category: SuggestionCategory::Sleep,
        icon: "😴",
        applies: |cx| cx.metrics.sleep_hours < cx.config.sleep_critical_below,
        describe: |cx| {
            format!(
                "You slept {:.1} hours, well under the recommended 7-9. Sleep drives memory \
                 consolidation and focus, so work your way up to at least 7 hours.",
                cx.metrics.sleep_hours
            )
        },
    },
    SuggestionRule {
        id: "sleep_low",
        title: "Aim for More Sleep",
        priority: Priority::Medium,
        category: SuggestionCategory::Sleep,
        icon: "💤",
        applies: |cx| {
            let s = cx.metrics.sleep_hours;
            s >= cx.config.sleep_critical_below && s < cx.config.sleep_low_below
        },
        describe: |cx| {
            format!(
                "You slept {:.1} hours, close to the 7-9 hour target. Going to bed 30-60 \
                 minutes earlier would close the gap.",
                cx.metrics.sleep_hours
            )
        },
    },
    SuggestionRule {
        id: "sleep_excess",
        title: "Review Sleep Schedule",
        priority: Priority::Low,
        category: SuggestionCategory::Sleep,
        icon: "⏰",
        applies: |cx| cx.metrics.sleep_hours > cx.config.sleep_excess_above,
        describe: |cx| {
            format!(
                "You slept {:.1} hours, above the usual 7-9. Very long sleep can point to \
                 fatigue or poor sleep quality; a consistent schedule helps.",
                cx.metrics.sleep_hours
            )
        },
    },
    SuggestionRule {
        id: "study_excess",
        title: "Reduce Study Hours",
        priority: Priority::High,
        category: SuggestionCategory::Study,
        icon: "📚",
        applies: |cx| cx.metrics.study_hours > cx.config.study_excess_above,
        describe: |cx| {
            format!(
                "You studied {:.1} hours, beyond the effective 4-8 hour range. Returns \
                 diminish with very long sessions; split the day into shorter focused blocks.",
                cx.metrics.study_hours
            )
        },
    },
    SuggestionRule {
        id: "study_high",
        title: "Optimize Study Duration",
        priority: Priority::Medium,
        category: SuggestionCategory::Study,
        icon: "⏱️",
        applies: |cx| {
            let s = cx.metrics.study_hours;
            s > cx.config.study_high_above && s <= cx.config.study_excess_above
        },
        describe: |cx| {
            format!(
                "You studied {:.1} hours. Around 4-8 hours of focused work tends to be most \
                 effective; favour quality over quantity.",
                cx.metrics.study_hours
            )
        },
    },
    SuggestionRule {
        id: "study_low",
        title: "Increase Study Time",
        priority: Priority::Medium,
        category: SuggestionCategory::Study,
        icon: "📖",
        applies: |cx| cx.metrics.study_hours < cx.config.study_low_below,
        describe: |cx| {
            format!(
                "You studied {:.1} hours. Steady progress needs about 4-6 focused hours a \
                 day, spread across manageable chunks.",
                cx.metrics.study_hours
            )
        },
    },
    SuggestionRule {
        id: "break_critical",
        title: "Take More Breaks",
        priority: Priority::High,
        category: SuggestionCategory::Break,
        icon: "☕",
        applies: |cx| cx.metrics.break_time < cx.config.break_critical_below,
        describe: |cx| {
            format!(
                "You took only {:.1} hours of breaks. Regular pauses keep focus up and \
                 prevent mental fatigue; try 25 minutes of study followed by 5 minutes off.",
                cx.metrics.break_time
            )
        },
    },
    SuggestionRule {
        id: "break_low",
        title: "Increase Break Time",
        priority: Priority::Medium,
        category: SuggestionCategory::Break,
        icon: "🌿",
        applies: |cx| {
            let b = cx.metrics.break_time;
            b >= cx.config.break_critical_below && b < cx.config.break_low_below
        },
        describe: |cx| {
            format!(
                "You took {:.1} hours of breaks. Aim for 1-3 hours in total, with a short \
                 break every hour or two of study.",
                cx.metrics.break_time
            )
        },
    },
    SuggestionRule {
        id: "break_excess",
        title: "Balance Study and Breaks",
        priority: Priority::Low,
        category: SuggestionCategory::Break,
        icon: "⚖️",
        applies: |cx| cx.metrics.break_time > cx.config.break_excess_above,
        describe: |cx| {
            format!(
                "You took {:.1} hours of breaks, which can break study momentum. About 1-3 \
                 hours of breaks for 4-8 hours of study is a good balance.",
                cx.metrics.break_time
            )
        },
    },
    SuggestionRule {
        id: "screen_excess",
        title: "Reduce Screen Time",
        priority: Priority::High,
        category: SuggestionCategory::Screen,
        icon: "👁️",
        applies: |cx| cx.metrics.screen_time > cx.config.screen_excess_above,
        describe: |cx| {
            format!(
                "You spent {:.1} hours on screens. Heavy screen use causes eye strain and \
                 fatigue; keep it to 6-8 hours and follow the 20-20-20 rule.",
                cx.metrics.screen_time
            )
        },
    },
    SuggestionRule {
        id: "screen_high",
        title: "Manage Screen Usage",
        priority: Priority::Medium,
        category: SuggestionCategory::Screen,
        icon: "💻",
        applies: |cx| {
            let s = cx.metrics.screen_time;
            s > cx.config.screen_high_above && s <= cx.config.screen_excess_above
        },
        describe: |cx| {
            format!(
                "You spent {:.1} hours on screens. Mix in offline study such as paper notes \
                 or printed reading, and take regular eye breaks.",
                cx.metrics.screen_time
            )
        },
    },
    SuggestionRule {
        id: "rebalance",
        title: "Rebalance Your Study Routine",
        priority: Priority::High,
        category: SuggestionCategory::Balance,
        icon: "⚖️",
        applies: |cx| cx.concerning_factors() >= cx.config.rebalance_min_factors,
        describe: |_| {
            "Several areas need attention at once. Plan a balanced day: 7-9h of sleep, 4-8h \
             of study, 1-3h of breaks and no more than 6-8h of screen time."
                .to_string()
        },
    },
    SuggestionRule {
        id: "productivity",
        title: "Improve Overall Productivity",
        priority: Priority::High,
        category: SuggestionCategory::Balance,
        icon: "📊",
        applies: |cx| {
            cx.score
                .is_some_and(|s| s.total_score < cx.config.productivity_below)
        },
        describe: |cx| {
            format!(
                "Your productivity score is {:.1}/100. Start with the lowest components in \
                 the breakdown; small gains there lift the total quickly.",
                cx.score.map_or(0.0, |s| s.total_score)
            )
        },
    },
    SuggestionRule {
        id: "burnout_high",
        title: "High Burnout Risk Detected",
        priority: Priority::High,
        category: SuggestionCategory::Balance,
        icon: "🚨",
        applies: |cx| cx.risk == Some(RiskLevel::High),
        describe: |_| {
            "Your pattern shows a high burnout risk. Cut back study hours, protect 7-9h of \
             sleep, take more breaks and limit screens. Talking to an academic advisor or \
             counsellor can help."
                .to_string()
        },
    },
    SuggestionRule {
        id: "burnout_medium",
        title: "Monitor Burnout Risk",
        priority: Priority::Medium,
        category: SuggestionCategory::Balance,
        icon: "⚠️",
        applies: |cx| cx.risk == Some(RiskLevel::Medium),
        describe: |_| {
            "Your burnout risk is moderate. Keep sleep adequate, take regular breaks and \
             watch your stress levels before they build up."
                .to_string()
        },
    },
    SuggestionRule {
        id: "mood_low",
        title: "Boost Your Mood",
        priority: Priority::Medium,
        category: SuggestionCategory::Mood,
        icon: "😊",
        applies: |cx| cx.metrics.mood_level == MoodLevel::Low,
        describe: |_| {
            "Your mood is low today. Breaks spent on things you enjoy, exercise, time with \
             friends and enough sleep all help. Your well-being matters as much as your grades."
                .to_string()
        },
    },
];

const REINFORCEMENT: SuggestionRule = SuggestionRule {
    id: "great_habits",
    title: "Great Study Habits!",
    priority: Priority::Low,
    category: SuggestionCategory::Balance,
    icon: "🌟",
    applies: |cx| cx.healthy_factors() >= cx.config.reinforcement_min_factors,
    describe: |_| {
        "Your sleep, study, breaks and screen time are in healthy ranges. Keep this routine \
         going."
            .to_string()
    },
};

/// Rule-based suggestion generator
#[derive(Debug, Clone, Default)]
pub struct SuggestionEngine {
    config: SuggestionConfig,
}

impl SuggestionEngine {
    pub fn new(config: SuggestionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SuggestionConfig {
        &self.config
    }

    /// Ids of every rule in evaluation order, reinforcement last
    pub fn rule_ids() -> impl Iterator<Item = &'static str> {
        RULES.iter().map(|r| r.id).chain(std::iter::once(REINFORCEMENT.id))
    }

    /// Generate suggestions for a day. Rules depending on an absent score or
    /// risk level do not fire.
    pub fn suggest(
        &self,
        metrics: &DailyMetrics,
        score: Option<&ScoreBreakdown>,
        risk: Option<RiskLevel>,
    ) -> Vec<Suggestion> {
        let cx = Context {
            metrics,
            score,
            risk,
            config: &self.config,
        };

        let mut suggestions: Vec<Suggestion> = RULES
            .iter()
            .filter(|rule| (rule.applies)(&cx))
            .map(|rule| rule.build(&cx))
            .collect();

        if suggestions.is_empty() && (REINFORCEMENT.applies)(&cx) {
            suggestions.push(REINFORCEMENT.build(&cx));
        }

        suggestions.sort_by_key(|s| s.priority.rank());
        suggestions.truncate(self.config.max_suggestions);
        suggestions
    }
}
