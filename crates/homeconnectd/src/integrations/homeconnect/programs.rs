//! Program keys exposed as switches, per appliance type.

pub const DRYER: &[&str] = &[
    "LaundryCare.Dryer.Program.Cotton",
    "LaundryCare.Dryer.Program.Synthetic",
    "LaundryCare.Dryer.Program.Mix",
    "LaundryCare.Dryer.Program.Blankets",
    "LaundryCare.Dryer.Program.BusinessShirts",
    "LaundryCare.Dryer.Program.DownFeathers",
    "LaundryCare.Dryer.Program.Hygiene",
    "LaundryCare.Dryer.Program.Jeans",
    "LaundryCare.Dryer.Program.Outdoor",
    "LaundryCare.Dryer.Program.SyntheticRefresh",
    "LaundryCare.Dryer.Program.Towels",
    "LaundryCare.Dryer.Program.Delicates",
    "LaundryCare.Dryer.Program.Super40",
    "LaundryCare.Dryer.Program.Shirts15",
    "LaundryCare.Dryer.Program.Pillow",
    "LaundryCare.Dryer.Program.AntiShrink",
];

pub const WASHER: &[&str] = &[
    "LaundryCare.Washer.Program.Cotton",
    "LaundryCare.Washer.Program.Cotton.CottonEco",
    "LaundryCare.Washer.Program.EasyCare",
    "LaundryCare.Washer.Program.Mix",
    "LaundryCare.Washer.Program.DelicatesSilk",
    "LaundryCare.Washer.Program.Wool",
    "LaundryCare.Washer.Program.Sensitive",
    "LaundryCare.Washer.Program.Auto30",
    "LaundryCare.Washer.Program.Auto40",
    "LaundryCare.Washer.Program.Auto60",
    "LaundryCare.Washer.Program.Chiffon",
    "LaundryCare.Washer.Program.Curtains",
    "LaundryCare.Washer.Program.DarkWash",
    "LaundryCare.Washer.Program.Dessous",
    "LaundryCare.Washer.Program.Monsoon",
    "LaundryCare.Washer.Program.Outdoor",
    "LaundryCare.Washer.Program.PlushToy",
    "LaundryCare.Washer.Program.ShirtsBlouses",
    "LaundryCare.Washer.Program.SportFitness",
    "LaundryCare.Washer.Program.Towels",
    "LaundryCare.Washer.Program.WaterProof",
];

/// Washer programs followed by dryer programs
pub const WASHER_DRYER: &[&str] = &[
    "LaundryCare.Washer.Program.Cotton",
    "LaundryCare.Washer.Program.Cotton.CottonEco",
    "LaundryCare.Washer.Program.EasyCare",
    "LaundryCare.Washer.Program.Mix",
    "LaundryCare.Washer.Program.DelicatesSilk",
    "LaundryCare.Washer.Program.Wool",
    "LaundryCare.Washer.Program.Sensitive",
    "LaundryCare.Washer.Program.Auto30",
    "LaundryCare.Washer.Program.Auto40",
    "LaundryCare.Washer.Program.Auto60",
    "LaundryCare.Washer.Program.Chiffon",
    "LaundryCare.Washer.Program.Curtains",
    "LaundryCare.Washer.Program.DarkWash",
    "LaundryCare.Washer.Program.Dessous",
    "LaundryCare.Washer.Program.Monsoon",
    "LaundryCare.Washer.Program.Outdoor",
    "LaundryCare.Washer.Program.PlushToy",
    "LaundryCare.Washer.Program.ShirtsBlouses",
    "LaundryCare.Washer.Program.SportFitness",
    "LaundryCare.Washer.Program.Towels",
    "LaundryCare.Washer.Program.WaterProof",
    "LaundryCare.Dryer.Program.Cotton",
    "LaundryCare.Dryer.Program.Synthetic",
    "LaundryCare.Dryer.Program.Mix",
    "LaundryCare.Dryer.Program.Blankets",
    "LaundryCare.Dryer.Program.BusinessShirts",
    "LaundryCare.Dryer.Program.DownFeathers",
    "LaundryCare.Dryer.Program.Hygiene",
    "LaundryCare.Dryer.Program.Jeans",
    "LaundryCare.Dryer.Program.Outdoor",
    "LaundryCare.Dryer.Program.SyntheticRefresh",
    "LaundryCare.Dryer.Program.Towels",
    "LaundryCare.Dryer.Program.Delicates",
    "LaundryCare.Dryer.Program.Super40",
    "LaundryCare.Dryer.Program.Shirts15",
    "LaundryCare.Dryer.Program.Pillow",
    "LaundryCare.Dryer.Program.AntiShrink",
];

pub const DISHWASHER: &[&str] = &[
    "Dishcare.Dishwasher.Program.Auto1",
    "Dishcare.Dishwasher.Program.Auto2",
    "Dishcare.Dishwasher.Program.Auto3",
    "Dishcare.Dishwasher.Program.Eco50",
    "Dishcare.Dishwasher.Program.Quick45",
    "Dishcare.Dishwasher.Program.Intensiv70",
    "Dishcare.Dishwasher.Program.Normal65",
    "Dishcare.Dishwasher.Program.Glas40",
    "Dishcare.Dishwasher.Program.GlassCare",
    "Dishcare.Dishwasher.Program.NightWash",
    "Dishcare.Dishwasher.Program.Quick65",
    "Dishcare.Dishwasher.Program.Normal45",
    "Dishcare.Dishwasher.Program.Intensiv45",
    "Dishcare.Dishwasher.Program.AutoHalfLoad",
    "Dishcare.Dishwasher.Program.IntensivPower",
    "Dishcare.Dishwasher.Program.MagicDaily",
    "Dishcare.Dishwasher.Program.Super60",
    "Dishcare.Dishwasher.Program.Kurz60",
    "Dishcare.Dishwasher.Program.ExpressSparkle65",
    "Dishcare.Dishwasher.Program.MachineCare",
    "Dishcare.Dishwasher.Program.SteamFresh",
    "Dishcare.Dishwasher.Program.MaximumCleaning",
];

pub const OVEN: &[&str] = &[
    "Cooking.Oven.Program.HeatingMode.PreHeating",
    "Cooking.Oven.Program.HeatingMode.HotAir",
    "Cooking.Oven.Program.HeatingMode.TopBottomHeating",
    "Cooking.Oven.Program.HeatingMode.PizzaSetting",
    "Cooking.Oven.Program.Microwave.600Watt",
    "Cooking.Oven.Program.HeatingMode.SlowCook",
    "Cooking.Oven.Program.HeatingMode.HotAirEco",
    "Cooking.Oven.Program.HeatingMode.TopBottomHeatingEco",
    "Cooking.Oven.Program.HeatingMode.HotAirGrilling",
    "Cooking.Oven.Program.HeatingMode.IntensiveHeat",
    "Cooking.Oven.Program.HeatingMode.BottomHeating",
    "Cooking.Oven.Program.HeatingMode.PreheatOvenware",
    "Cooking.Oven.Program.HeatingMode.Desiccation",
    "Cooking.Oven.Program.HeatingMode.KeepWarm",
];

pub const COFFEE_MAKER: &[&str] = &[
    "ConsumerProducts.CoffeeMaker.Program.Beverage.Espresso",
    "ConsumerProducts.CoffeeMaker.Program.Beverage.EspressoMacchiato",
    "ConsumerProducts.CoffeeMaker.Program.Beverage.Coffee",
    "ConsumerProducts.CoffeeMaker.Program.Beverage.Cappuccino",
    "ConsumerProducts.CoffeeMaker.Program.Beverage.LatteMacchiato",
    "ConsumerProducts.CoffeeMaker.Program.Beverage.CaffeLatte",
    "ConsumerProducts.CoffeeMaker.Program.CoffeeWorld.Americano",
    "ConsumerProducts.CoffeeMaker.Program.Beverage.EspressoDoppio",
    "ConsumerProducts.CoffeeMaker.Program.CoffeeWorld.FlatWhite",
    "ConsumerProducts.CoffeeMaker.Program.CoffeeWorld.Galao",
    "ConsumerProducts.CoffeeMaker.Program.Beverage.MilkFroth",
    "ConsumerProducts.CoffeeMaker.Program.Beverage.WarmMilk",
    "ConsumerProducts.CoffeeMaker.Program.Beverage.Ristretto",
    "ConsumerProducts.CoffeeMaker.Program.CoffeeWorld.Cortado",
    "ConsumerProducts.CoffeeMaker.Program.CoffeeWorld.CafeCortado",
    "ConsumerProducts.CoffeeMaker.Program.CoffeeWorld.WienerMelange",
    "ConsumerProducts.CoffeeMaker.Program.CoffeeWorld.KleinerBrauner",
    "ConsumerProducts.CoffeeMaker.Program.CoffeeWorld.GrosserBrauner",
    "ConsumerProducts.CoffeeMaker.Program.CoffeeWorld.Verlaengerter",
    "ConsumerProducts.CoffeeMaker.Program.CoffeeWorld.VerlaengerterBraun",
    "ConsumerProducts.CoffeeMaker.Program.CoffeeWorld.CafeConLeche",
    "ConsumerProducts.CoffeeMaker.Program.CoffeeWorld.CafeAuLait",
    "ConsumerProducts.CoffeeMaker.Program.CoffeeWorld.Doppio",
    "ConsumerProducts.CoffeeMaker.Program.CoffeeWorld.Kaapi",
    "ConsumerProducts.CoffeeMaker.Program.CoffeeWorld.KoffieVerkeerd",
    "ConsumerProducts.CoffeeMaker.Program.CoffeeWorld.Garoto",
    "ConsumerProducts.CoffeeMaker.Program.CoffeeWorld.RedEye",
    "ConsumerProducts.CoffeeMaker.Program.CoffeeWorld.BlackEye",
    "ConsumerProducts.CoffeeMaker.Program.CoffeeWorld.DeadEye",
];

pub const HOOD: &[&str] = &[
    "Cooking.Common.Program.Hood.Automatic",
    "Cooking.Common.Program.Hood.Venting",
    "Cooking.Common.Program.Hood.DelayedShutOff",
];

pub const HOB: &[&str] = &["Cooking.Hob.Program.PowerLevelMode"];
