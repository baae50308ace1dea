//! Canned assistant replies. No model is called.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::settings::Settings;

pub const MISSING_KEY_REPLY: &str =
    "Please add either an OpenAI or Claude API key in settings to use the chat functionality.";

const TERMINAL_KEYWORDS: &[&str] = &["terminal", "command", "bash", "shell", "script"];
const COMMAND_REPLY_KEYWORDS: &[&str] =
    &["command", "terminal", "shell", "bash", "script", "docker"];

pub const COMMAND_REPLY: &str = "Here are some commands you might find useful:

```bash
# List all running Docker containers
docker ps

# Check Kubernetes pod status
kubectl get pods

# View resource usage
top

# Check disk space
df -h
```

You can run these commands directly from the terminal tab by clicking the run button.";

pub const GENERAL_REPLIES: [&str; 4] = [
    "I've analyzed your logs and found a potential issue with your Docker configuration.\n\nThe problem appears to be in your network settings. Try updating your Docker daemon.json file with the following configuration:\n\n```json\n{\n  \"dns\": [\"8.8.8.8\", \"8.8.4.4\"],\n  \"max-concurrent-downloads\": 10,\n  \"max-concurrent-uploads\": 5\n}\n```\n\nThis should help resolve the connectivity issues you're experiencing.",
    "That Kubernetes command looks correct, but you might want to consider adding a namespace.\n\nInstead of:\n`kubectl get pods`\n\nTry using:\n`kubectl get pods -n your-namespace`\n\nThis will scope your query to a specific namespace and make it easier to find the pods you're looking for.",
    "Here's a more efficient way to write that shell script:\n\n```bash\n#!/bin/bash\n\n# Function to process files\nprocess_files() {\n  local dir=$1\n  \n  find \"$dir\" -type f -name \"*.log\" | while read file; do\n    echo \"Processing $file...\"\n    grep \"ERROR\" \"$file\" >> errors.log\n  done\n}\n\n# Main execution\nprocess_files \"/var/log\"\necho \"Done!\"\n```\n\nThis version uses a function to improve readability and uses the find command more efficiently.",
    "Your YAML appears to be valid, but there might be some indentation issues in line 8.\n\nHere's the corrected version:\n\n```yaml\napiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: app-config\n  namespace: production\ndata:\n  DATABASE_URL: \"postgresql://user:password@db:5432/app\"\n  REDIS_HOST: \"redis-master.default.svc.cluster.local\"\n  LOG_LEVEL: \"info\"\n```\n\nMake sure the indentation is consistent using spaces (not tabs) throughout your YAML files.",
];

fn mentions_any(message: &str, keywords: &[&str]) -> bool {
    let lowered = message.to_lowercase();
    keywords.iter().any(|keyword| lowered.contains(keyword))
}

/// Whether a user message should flag the terminal tab right away.
pub fn mentions_terminal(message: &str) -> bool {
    mentions_any(message, TERMINAL_KEYWORDS)
}

pub fn can_reply(settings: &Settings) -> bool {
    settings.api_keys.has_chat_provider()
}

pub fn mock_reply<R: Rng + ?Sized>(message: &str, rng: &mut R) -> String {
    if mentions_any(message, COMMAND_REPLY_KEYWORDS) {
        return COMMAND_REPLY.to_string();
    }
    GENERAL_REPLIES
        .choose(rng)
        .copied()
        .unwrap_or(GENERAL_REPLIES[0])
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn command_questions_get_command_list() {
        let mut rng = StdRng::seed_from_u64(7);
        let reply = mock_reply("Which Docker command lists containers?", &mut rng);
        assert_eq!(reply, COMMAND_REPLY);
        let commands: Vec<String> = extract(&reply).into_iter().map(|c| c.command).collect();
        assert_eq!(commands, vec!["docker ps", "kubectl get pods", "top", "df -h"]);
    }

    #[test]
    fn other_questions_get_a_general_reply() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..8 {
            let reply = mock_reply("why is my pod pending?", &mut rng);
            assert!(GENERAL_REPLIES.contains(&reply.as_str()));
        }
    }

    #[test]
    fn docker_alone_does_not_flag_terminal() {
        assert!(!mentions_terminal("docker is slow"));
        assert!(mentions_terminal("Open a TERMINAL please"));
    }

    #[test]
    fn general_replies_carry_no_runnable_shell_commands_except_script() {
        let counts: Vec<usize> = GENERAL_REPLIES.iter().map(|reply| extract(reply).len()).collect();
        assert_eq!(counts[0], 0);
        assert_eq!(counts[1], 0);
        assert!(counts[2] > 0);
        assert_eq!(counts[3], 0);
    }
}
